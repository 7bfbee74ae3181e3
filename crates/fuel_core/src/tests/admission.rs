use super::*;

#[test]
fn test_single_consumer_is_admitted_immediately() {
    let station = station_with(5, |c| c.fill_time_ms = MillisRange::fixed(150));
    let (handle, _) = spawn_request(&station, VehicleId::consumer(0), FuelLoad::new(10, 10));

    // Admission and withdrawal take the lock separately; wait for both.
    let (docked, seen) =
        wait_for_snapshot(&station, PATIENCE, |s| s.free_slots == 3 && s.nitrogen == 490);
    assert!(seen, "consumer never docked: {docked:?}");
    assert_eq!(docked.nitrogen, 490);
    assert_eq!(docked.quantum, 490);
    assert_eq!(docked.remaining_consumer_trips, 5);

    let received = handle.join().unwrap();
    assert_eq!(received, FuelLoad::new(10, 10));

    let after = station.snapshot();
    assert_eq!(after.free_slots, 4);
    assert_eq!(after.remaining_consumer_trips, 4);
    assert_eq!(station.stats().admission_waits, 0);
    assert_eq!(station.stats().consumer_fills, 1);
}

#[test]
fn test_supplier_fill_does_not_count_as_consumer_trip() {
    let station = station_with(3, |_| {});
    let received = station.request_fuel(VehicleId::supplier(0), FuelLoad::new(20, 5));
    assert_eq!(received, FuelLoad::new(20, 5));
    assert_eq!(station.remaining_consumer_trips(), 3);
    assert_eq!(station.stats().supplier_fills, 1);
}

#[test]
fn test_request_blocks_while_no_slot_is_free() {
    let station = station_with(5, |c| {
        c.docking_slots = 1;
        c.fill_time_ms = MillisRange::fixed(300);
    });
    let (first, _) = spawn_request(&station, VehicleId::consumer(0), FuelLoad::new(1, 1));
    let (_, docked) = wait_for_snapshot(&station, PATIENCE, |s| s.free_slots == 0);
    assert!(docked);

    let (second, second_done) =
        spawn_request(&station, VehicleId::consumer(1), FuelLoad::new(7, 7));
    thread::sleep(Duration::from_millis(100));
    let blocked = station.snapshot();
    assert!(!second_done.load(Ordering::SeqCst), "second request should still be blocked");
    assert_eq!(blocked.free_slots, 0);
    assert_eq!(blocked.nitrogen, 499, "blocked request must not touch the pools");
    assert_eq!(blocked.quantum, 499);

    first.join().unwrap();
    assert_eq!(second.join().unwrap(), FuelLoad::new(7, 7));
    let after = station.snapshot();
    assert_eq!(after.free_slots, 1);
    assert_eq!(after.nitrogen, 492);
    assert_eq!(after.remaining_consumer_trips, 3);
    assert_eq!(station.stats().admission_waits, 1);
}

#[test]
fn test_request_waits_for_fuel_then_proceeds_after_delivery() {
    let station = station_with(2, |c| c.initial_nitrogen = Some(30));
    let (consumer, consumer_done) =
        spawn_request(&station, VehicleId::consumer(0), FuelLoad::new(45, 0));

    thread::sleep(Duration::from_millis(50));
    assert!(!consumer_done.load(Ordering::SeqCst));
    assert_eq!(station.snapshot().free_slots, 4);

    let outcome = station.deliver_fuel(
        VehicleId::supplier(0),
        FuelLoad::of(FuelKind::Nitrogen, 400),
    );
    assert_eq!(outcome, DeliveryOutcome::Delivered);
    assert_eq!(consumer.join().unwrap(), FuelLoad::new(45, 0));
    assert_eq!(station.snapshot().nitrogen, 385);
}

#[test]
fn test_zero_order_only_needs_a_slot() {
    let station = station_with(1, |c| {
        c.initial_nitrogen = Some(0);
        c.initial_quantum = Some(0);
    });
    let received = station.request_fuel(VehicleId::consumer(0), FuelLoad::EMPTY);
    assert_eq!(received, FuelLoad::EMPTY);
    assert_eq!(station.remaining_consumer_trips(), 0);
}

#[test]
fn test_trip_counter_saturates_at_zero() {
    let station = station_with(1, |_| {});
    station.request_fuel(VehicleId::consumer(0), FuelLoad::new(1, 1));
    station.request_fuel(VehicleId::consumer(0), FuelLoad::new(1, 1));
    assert_eq!(station.remaining_consumer_trips(), 0);
    assert_eq!(station.stats().consumer_fills, 2);
}

#[test]
fn test_reading_trip_counter_is_idempotent() {
    let station = station_with(12, |_| {});
    let first = station.remaining_consumer_trips();
    for _ in 0..10 {
        assert_eq!(station.remaining_consumer_trips(), first);
    }
    assert_eq!(station.snapshot(), station.snapshot());
}

#[test]
fn test_many_consumers_terminate_and_restore_slots() {
    let config = fast_config();
    let station = Arc::new(Station::new(config.clone(), 24));
    let handles: Vec<_> = (0..8)
        .map(|n| {
            let station = Arc::clone(&station);
            thread::spawn(move || {
                for _ in 0..3 {
                    station.request_fuel(VehicleId::consumer(n), FuelLoad::new(10, 8));
                }
            })
        })
        .collect();

    let sampler = {
        let station = Arc::clone(&station);
        let config = config.clone();
        thread::spawn(move || {
            while station.remaining_consumer_trips() > 0 {
                assert_within_bounds(&config, &station.snapshot());
                thread::yield_now();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    sampler.join().unwrap();

    let end = station.snapshot();
    assert_eq!(end.free_slots, config.docking_slots);
    assert_eq!(end.remaining_consumer_trips, 0);
    assert_eq!(end.nitrogen, 500 - 24 * 10);
    assert_eq!(end.quantum, 500 - 24 * 8);
    assert_eq!(station.stats().admissions, 24);
}
