//! Vehicle drivers that exercise the station from their own threads.
//!
//! Each vehicle owns its random source, trip counter and delays. The only
//! shared state is the [`Station`] they are driven against.

use fuel_core::{DeliveryOutcome, FuelKind, FuelLoad, MillisRange, Station, VehicleId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::thread;

pub trait Vehicle: Send {
    fn id(&self) -> VehicleId;

    /// Run the vehicle's loop to completion against `station`.
    fn drive(&mut self, station: &Station) -> VehicleReport;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Upper bound of each consumer withdrawal, per fuel.
    pub vehicle_capacity: u32,
    pub trips_per_consumer: u32,
    /// Units a supplier brings of its cargo fuel on every visit.
    pub supplier_batch: u32,
    /// Upper bound of a supplier's own withdrawal, per fuel.
    pub supplier_capacity: u32,
    pub consumer_travel_ms: MillisRange,
    pub consumer_departure_ms: MillisRange,
    pub supplier_travel_ms: MillisRange,
    pub supplier_departure_ms: MillisRange,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            vehicle_capacity: 50,
            trips_per_consumer: 5,
            supplier_batch: 400,
            supplier_capacity: 50,
            consumer_travel_ms: MillisRange::new(0, 6000),
            consumer_departure_ms: MillisRange::new(0, 6000),
            supplier_travel_ms: MillisRange::new(0, 10_000),
            supplier_departure_ms: MillisRange::new(0, 10_000),
        }
    }
}

impl VehicleConfig {
    pub fn scale_timings(&mut self, factor: f64) {
        for range in [
            &mut self.consumer_travel_ms,
            &mut self.consumer_departure_ms,
            &mut self.supplier_travel_ms,
            &mut self.supplier_departure_ms,
        ] {
            *range = range.scaled(factor);
        }
    }

    pub fn delay_ranges(&self) -> [(&'static str, MillisRange); 4] {
        [
            ("consumer_travel_ms", self.consumer_travel_ms),
            ("consumer_departure_ms", self.consumer_departure_ms),
            ("supplier_travel_ms", self.supplier_travel_ms),
            ("supplier_departure_ms", self.supplier_departure_ms),
        ]
    }
}

/// Which fuel the `index`-th supplier hauls. Even indices carry nitrogen.
pub fn supplier_cargo(index: u32) -> FuelKind {
    if index % 2 == 0 {
        FuelKind::Nitrogen
    } else {
        FuelKind::Quantum
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleReport {
    pub vehicle: VehicleId,
    pub fills: u32,
    pub nitrogen_requested: u64,
    pub quantum_requested: u64,
    pub nitrogen_received: u64,
    pub quantum_received: u64,
    pub deliveries: u32,
    pub abandoned_deliveries: u32,
}

impl VehicleReport {
    fn new(vehicle: VehicleId) -> Self {
        Self {
            vehicle,
            fills: 0,
            nitrogen_requested: 0,
            quantum_requested: 0,
            nitrogen_received: 0,
            quantum_received: 0,
            deliveries: 0,
            abandoned_deliveries: 0,
        }
    }

    fn record_fill(&mut self, order: FuelLoad, received: FuelLoad) {
        self.fills += 1;
        self.nitrogen_requested += u64::from(order.nitrogen);
        self.quantum_requested += u64::from(order.quantum);
        self.nitrogen_received += u64::from(received.nitrogen);
        self.quantum_received += u64::from(received.quantum);
    }

    fn record_delivery(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.deliveries += 1,
            DeliveryOutcome::Abandoned => self.abandoned_deliveries += 1,
        }
    }

    /// Units asked for but not received because a pool ran dry after docking.
    pub fn shortfall(&self) -> u64 {
        (self.nitrogen_requested + self.quantum_requested)
            - (self.nitrogen_received + self.quantum_received)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn pause(range: MillisRange, rng: &mut ChaCha8Rng) {
    let delay = range.sample(rng);
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn random_order(capacity: u32, rng: &mut ChaCha8Rng) -> FuelLoad {
    FuelLoad::new(rng.gen_range(0..=capacity), rng.gen_range(0..=capacity))
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// Makes a fixed number of trips, withdrawing a random amount of both fuels each time.
pub struct ConsumerVehicle {
    id: VehicleId,
    trips_left: u32,
    capacity: u32,
    travel: MillisRange,
    departure: MillisRange,
    rng: ChaCha8Rng,
}

impl ConsumerVehicle {
    pub fn new(number: u32, config: &VehicleConfig, seed: u64) -> Self {
        Self {
            id: VehicleId::consumer(number),
            trips_left: config.trips_per_consumer,
            capacity: config.vehicle_capacity,
            travel: config.consumer_travel_ms,
            departure: config.consumer_departure_ms,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Vehicle for ConsumerVehicle {
    fn id(&self) -> VehicleId {
        self.id
    }

    fn drive(&mut self, station: &Station) -> VehicleReport {
        let mut report = VehicleReport::new(self.id);
        while self.trips_left > 0 {
            pause(self.travel, &mut self.rng);
            let order = random_order(self.capacity, &mut self.rng);
            let received = station.request_fuel(self.id, order);
            report.record_fill(order, received);
            pause(self.departure, &mut self.rng);
            self.trips_left -= 1;
        }
        tracing::debug!(vehicle = %self.id, fills = report.fills, "consumer done");
        report
    }
}

// ---------------------------------------------------------------------------
// Supplier
// ---------------------------------------------------------------------------

/// Hauls batches of one fuel until the station reports no consumer trips
/// left, topping up its own tank after every delivery attempt.
pub struct SupplierVehicle {
    id: VehicleId,
    cargo: FuelKind,
    batch: u32,
    capacity: u32,
    travel: MillisRange,
    departure: MillisRange,
    rng: ChaCha8Rng,
}

impl SupplierVehicle {
    pub fn new(number: u32, cargo: FuelKind, config: &VehicleConfig, seed: u64) -> Self {
        Self {
            id: VehicleId::supplier(number),
            cargo,
            batch: config.supplier_batch,
            capacity: config.supplier_capacity,
            travel: config.supplier_travel_ms,
            departure: config.supplier_departure_ms,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Vehicle for SupplierVehicle {
    fn id(&self) -> VehicleId {
        self.id
    }

    fn drive(&mut self, station: &Station) -> VehicleReport {
        let mut report = VehicleReport::new(self.id);
        while station.remaining_consumer_trips() > 0 {
            pause(self.travel, &mut self.rng);
            let outcome = station.deliver_fuel(self.id, FuelLoad::of(self.cargo, self.batch));
            report.record_delivery(outcome);

            let order = random_order(self.capacity, &mut self.rng);
            let received = station.request_fuel(self.id, order);
            report.record_fill(order, received);
            pause(self.departure, &mut self.rng);
        }
        tracing::debug!(
            vehicle = %self.id,
            cargo = %self.cargo,
            deliveries = report.deliveries,
            abandoned = report.abandoned_deliveries,
            "supplier done"
        );
        report
    }
}
