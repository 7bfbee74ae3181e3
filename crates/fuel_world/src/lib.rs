//! Simulation setup shared by the CLI and tests: config loading, validation,
//! and turning a consumer count into a fleet of vehicles.

use anyhow::{bail, Context, Result};
use fuel_control::{supplier_cargo, ConsumerVehicle, SupplierVehicle, Vehicle, VehicleConfig};
use fuel_core::{FuelKind, Station, StationConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_CONSUMERS: u32 = 20;
pub const DEFAULT_CONSUMERS: u32 = 10;

/// Seeds for suppliers start here so they never collide with consumer seeds.
const SUPPLIER_SEED_OFFSET: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub station: StationConfig,
    pub vehicles: VehicleConfig,
    /// Multiplier applied to every delay. 0.1 runs ten times faster.
    pub time_scale: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            station: StationConfig::default(),
            vehicles: VehicleConfig::default(),
            time_scale: 1.0,
        }
    }
}

impl SimConfig {
    /// Fold `time_scale` into every delay and reset it to 1.0.
    pub fn apply_time_scale(&mut self) {
        let factor = self.time_scale;
        self.station.scale_timings(factor);
        self.vehicles.scale_timings(factor);
        self.time_scale = 1.0;
    }
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file: {}", path.display()))?;
    let config: SimConfig = serde_json::from_str(&json)
        .with_context(|| format!("parsing config file: {}", path.display()))?;
    validate_config(&config).with_context(|| format!("validating {}", path.display()))?;
    Ok(config)
}

/// Reject configurations that cannot describe a working station.
pub fn validate_config(config: &SimConfig) -> Result<()> {
    let station = &config.station;
    if station.docking_slots == 0 {
        bail!("station 'docking_slots' must be > 0");
    }
    for kind in FuelKind::ALL {
        if station.initial_level(kind) > station.capacity(kind) {
            bail!(
                "initial {kind} level {} exceeds capacity {}",
                station.initial_level(kind),
                station.capacity(kind)
            );
        }
    }
    if !station.fill_time_ms.is_ordered() {
        bail!("station 'fill_time_ms' has min > max");
    }
    if station.delivery_poll_ms == 0 {
        bail!("station 'delivery_poll_ms' must be > 0");
    }

    let vehicles = &config.vehicles;
    for (name, range) in vehicles.delay_ranges() {
        if !range.is_ordered() {
            bail!("vehicle '{name}' has min > max");
        }
    }
    let smallest_pool = station.nitrogen_capacity.min(station.quantum_capacity);
    if vehicles.supplier_batch > smallest_pool {
        bail!(
            "supplier batch {} can never fit a pool of capacity {smallest_pool}",
            vehicles.supplier_batch
        );
    }

    if !(config.time_scale.is_finite() && config.time_scale > 0.0) {
        bail!("'time_scale' must be a positive number, got {}", config.time_scale);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FleetPlan {
    pub consumers: u32,
    pub suppliers: u32,
    pub trips_per_consumer: u32,
}

impl FleetPlan {
    /// Clamp the requested consumer count and derive one supplier per four consumers.
    pub fn new(requested_consumers: Option<u32>, trips_per_consumer: u32) -> Self {
        let consumers = requested_consumers
            .unwrap_or(DEFAULT_CONSUMERS)
            .min(MAX_CONSUMERS);
        Self {
            consumers,
            suppliers: consumers / 4,
            trips_per_consumer,
        }
    }

    pub fn total_consumer_trips(&self) -> u64 {
        u64::from(self.consumers) * u64::from(self.trips_per_consumer)
    }

    pub fn supplier_cargoes(&self) -> Vec<FuelKind> {
        (0..self.suppliers).map(supplier_cargo).collect()
    }
}

pub fn build_station(config: &SimConfig, plan: &FleetPlan) -> Station {
    Station::new(config.station.clone(), plan.total_consumer_trips())
}

/// Consumers first, then suppliers; every vehicle gets its own seed derived from `seed`.
pub fn build_fleet(config: &SimConfig, plan: &FleetPlan, seed: u64) -> Vec<Box<dyn Vehicle>> {
    let vehicles = VehicleConfig {
        trips_per_consumer: plan.trips_per_consumer,
        ..config.vehicles.clone()
    };
    let mut fleet: Vec<Box<dyn Vehicle>> = Vec::new();
    for n in 0..plan.consumers {
        let vehicle_seed = seed.wrapping_add(u64::from(n));
        fleet.push(Box::new(ConsumerVehicle::new(n, &vehicles, vehicle_seed)));
    }
    for (n, cargo) in (0..).zip(plan.supplier_cargoes()) {
        let vehicle_seed = seed
            .wrapping_add(SUPPLIER_SEED_OFFSET)
            .wrapping_add(u64::from(n));
        fleet.push(Box::new(SupplierVehicle::new(
            n,
            cargo,
            &vehicles,
            vehicle_seed,
        )));
    }
    fleet
}
