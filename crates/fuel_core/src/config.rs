use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::FuelKind;

/// Inclusive range of milliseconds, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillisRange {
    pub min: u64,
    pub max: u64,
}

impl MillisRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self { min: ms, max: ms }
    }

    pub const fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Draw a duration. An inverted range collapses to `min`.
    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        if self.max <= self.min {
            return Duration::from_millis(self.min);
        }
        Duration::from_millis(rng.gen_range(self.min..=self.max))
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            min: scale_ms(self.min, factor),
            max: scale_ms(self.max, factor),
        }
    }
}

fn scale_ms(ms: u64, factor: f64) -> u64 {
    (ms as f64 * factor).round() as u64
}

/// Which pools a delivery must fit into before it is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryCheck {
    /// Only the pool receiving the larger amount needs headroom.
    #[default]
    Dominant,
    /// Both pools need headroom for their share of the batch.
    BothPools,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub nitrogen_capacity: u32,
    pub quantum_capacity: u32,
    /// Starting level; `None` means the pool starts full.
    pub initial_nitrogen: Option<u32>,
    pub initial_quantum: Option<u32>,
    pub docking_slots: u32,
    /// Time a vehicle spends docked after withdrawing, outside the lock.
    pub fill_time_ms: MillisRange,
    /// Time a supplier holds the station lock while depositing.
    pub deposit_time_ms: u64,
    /// Upper bound on each wait inside `deliver_fuel`.
    pub delivery_poll_ms: u64,
    pub delivery_check: DeliveryCheck,
    /// Seeds the fill-time RNG.
    pub seed: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            nitrogen_capacity: 500,
            quantum_capacity: 500,
            initial_nitrogen: None,
            initial_quantum: None,
            docking_slots: 4,
            fill_time_ms: MillisRange::new(1000, 3000),
            deposit_time_ms: 1000,
            delivery_poll_ms: 2000,
            delivery_check: DeliveryCheck::Dominant,
            seed: 0,
        }
    }
}

impl StationConfig {
    pub const fn capacity(&self, kind: FuelKind) -> u32 {
        match kind {
            FuelKind::Nitrogen => self.nitrogen_capacity,
            FuelKind::Quantum => self.quantum_capacity,
        }
    }

    pub fn initial_level(&self, kind: FuelKind) -> u32 {
        match kind {
            FuelKind::Nitrogen => self.initial_nitrogen.unwrap_or(self.nitrogen_capacity),
            FuelKind::Quantum => self.initial_quantum.unwrap_or(self.quantum_capacity),
        }
    }

    /// Multiply every station delay by `factor`.
    pub fn scale_timings(&mut self, factor: f64) {
        self.fill_time_ms = self.fill_time_ms.scaled(factor);
        self.deposit_time_ms = scale_ms(self.deposit_time_ms, factor);
        // A zero poll would spin; keep at least one millisecond between re-checks.
        self.delivery_poll_ms = scale_ms(self.delivery_poll_ms, factor).max(1);
    }
}
