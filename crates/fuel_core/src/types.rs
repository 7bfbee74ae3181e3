//! Type definitions for `fuel_core`.
//!
//! Vehicle identities, fuel quantities, and the read-only views the station
//! hands out to callers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Only withdraws fuel.
    Consumer,
    /// Deposits a batch of one fuel, then withdraws a little of both.
    Supplier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleId {
    pub role: Role,
    pub number: u32,
}

impl VehicleId {
    pub const fn consumer(number: u32) -> Self {
        Self {
            role: Role::Consumer,
            number,
        }
    }

    pub const fn supplier(number: u32) -> Self {
        Self {
            role: Role::Supplier,
            number,
        }
    }

    pub fn is_supplier(&self) -> bool {
        self.role == Role::Supplier
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.role {
            Role::Consumer => write!(f, "vehicle_{:02}", self.number),
            Role::Supplier => write!(f, "supplier_{:02}", self.number),
        }
    }
}

// ---------------------------------------------------------------------------
// Fuel quantities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelKind {
    Nitrogen,
    Quantum,
}

impl FuelKind {
    pub const ALL: [FuelKind; 2] = [FuelKind::Nitrogen, FuelKind::Quantum];
}

impl std::fmt::Display for FuelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuelKind::Nitrogen => f.write_str("nitrogen"),
            FuelKind::Quantum => f.write_str("quantum fluid"),
        }
    }
}

/// A pair of fuel amounts. Used for withdrawal orders, delivery batches and
/// the receipts handed back after a fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelLoad {
    pub nitrogen: u32,
    pub quantum: u32,
}

impl FuelLoad {
    pub const EMPTY: FuelLoad = FuelLoad {
        nitrogen: 0,
        quantum: 0,
    };

    pub const fn new(nitrogen: u32, quantum: u32) -> Self {
        Self { nitrogen, quantum }
    }

    /// A load carrying only `kind`.
    pub const fn of(kind: FuelKind, amount: u32) -> Self {
        match kind {
            FuelKind::Nitrogen => Self::new(amount, 0),
            FuelKind::Quantum => Self::new(0, amount),
        }
    }

    pub const fn amount(&self, kind: FuelKind) -> u32 {
        match kind {
            FuelKind::Nitrogen => self.nitrogen,
            FuelKind::Quantum => self.quantum,
        }
    }

    /// The fuel with the larger amount. Ties resolve to nitrogen.
    pub const fn dominant(&self) -> FuelKind {
        if self.nitrogen < self.quantum {
            FuelKind::Quantum
        } else {
            FuelKind::Nitrogen
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.nitrogen) + u64::from(self.quantum)
    }
}

// ---------------------------------------------------------------------------
// Outcomes and views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    /// Every consumer trip was finished before headroom opened up; nothing was deposited.
    Abandoned,
}

/// Point-in-time view of the station's shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub nitrogen: u32,
    pub quantum: u32,
    pub free_slots: u32,
    pub max_slots: u32,
    pub remaining_consumer_trips: u64,
}

impl StationSnapshot {
    pub const fn level(&self, kind: FuelKind) -> u32 {
        match kind {
            FuelKind::Nitrogen => self.nitrogen,
            FuelKind::Quantum => self.quantum,
        }
    }
}

/// Cumulative counters maintained under the station lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStats {
    pub admissions: u64,
    /// Requests that found the admission condition false at least once.
    pub admission_waits: u64,
    pub consumer_fills: u64,
    pub supplier_fills: u64,
    pub nitrogen_withdrawn: u64,
    pub quantum_withdrawn: u64,
    /// Units requested but not received because a pool ran dry after admission.
    pub shortfall: u64,
    pub deliveries: u64,
    pub abandoned_deliveries: u64,
    /// Timed waits in `deliver_fuel` that expired without a notification.
    pub delivery_timeouts: u64,
    pub nitrogen_delivered: u64,
    pub quantum_delivered: u64,
}

impl StationStats {
    /// Sum of the counters that only move when a vehicle makes headway.
    pub const fn progress_marker(&self) -> u64 {
        self.admissions + self.consumer_fills + self.supplier_fills + self.deliveries
    }
}
