use super::*;
use crate::test_fixtures::{assert_within_bounds, fast_config, wait_for_snapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

mod admission;

// --- Shared test helpers ------------------------------------------------

fn station_with(consumer_trips: u64, tweak: impl FnOnce(&mut StationConfig)) -> Arc<Station> {
    let mut config = fast_config();
    tweak(&mut config);
    Arc::new(Station::new(config, consumer_trips))
}

/// Run `request_fuel` on its own thread and flag completion.
fn spawn_request(
    station: &Arc<Station>,
    vehicle: VehicleId,
    order: FuelLoad,
) -> (thread::JoinHandle<FuelLoad>, Arc<AtomicBool>) {
    let done = Arc::new(AtomicBool::new(false));
    let handle = {
        let station = Arc::clone(station);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let received = station.request_fuel(vehicle, order);
            done.store(true, Ordering::SeqCst);
            received
        })
    };
    (handle, done)
}

const PATIENCE: Duration = Duration::from_secs(5);
