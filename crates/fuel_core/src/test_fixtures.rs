//! Shared test fixtures for fuel_core and downstream crates.
//!
//! Timings are compressed to a few milliseconds so threaded scenarios finish
//! quickly; pool sizes and slot counts keep their production defaults.

use crate::{MillisRange, Station, StationConfig, StationSnapshot};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default layout (500/500 pools, 4 slots) with millisecond timings.
pub fn fast_config() -> StationConfig {
    StationConfig {
        fill_time_ms: MillisRange::new(1, 3),
        deposit_time_ms: 1,
        delivery_poll_ms: 5,
        seed: 7,
        ..StationConfig::default()
    }
}

pub fn fast_station(consumer_trips: u64) -> Arc<Station> {
    Arc::new(Station::new(fast_config(), consumer_trips))
}

/// Poll `station` until `predicate` holds or `timeout` elapses.
/// Returns the last snapshot observed and whether the predicate held.
pub fn wait_for_snapshot(
    station: &Station,
    timeout: Duration,
    predicate: impl Fn(&StationSnapshot) -> bool,
) -> (StationSnapshot, bool) {
    let deadline = Instant::now() + timeout;
    loop {
        let snapshot = station.snapshot();
        if predicate(&snapshot) {
            return (snapshot, true);
        }
        if Instant::now() >= deadline {
            return (snapshot, false);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Asserts the bounds every reachable state must respect.
pub fn assert_within_bounds(config: &StationConfig, snapshot: &StationSnapshot) {
    assert!(
        snapshot.free_slots <= config.docking_slots,
        "free slots {} above maximum {}",
        snapshot.free_slots,
        config.docking_slots
    );
    assert!(
        snapshot.nitrogen <= config.nitrogen_capacity,
        "nitrogen {} above capacity {}",
        snapshot.nitrogen,
        config.nitrogen_capacity
    );
    assert!(
        snapshot.quantum <= config.quantum_capacity,
        "quantum {} above capacity {}",
        snapshot.quantum,
        config.quantum_capacity
    );
}
