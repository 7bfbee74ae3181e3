//! The station monitor.
//!
//! One coarse lock guards every pool level, the docking slots and the
//! remaining-trip counter. A single condition variable is shared by all
//! waiters, so every state change wakes everyone and each waiter re-checks its
//! own predicate. Wake order is whatever the scheduler picks.

use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    DeliveryCheck, DeliveryOutcome, FuelKind, FuelLoad, StationConfig, StationSnapshot,
    StationStats, VehicleId,
};

pub struct Station {
    config: StationConfig,
    state: Mutex<StationState>,
    changed: Condvar,
}

struct StationState {
    nitrogen: u32,
    quantum: u32,
    free_slots: u32,
    remaining_consumer_trips: u64,
    rng: ChaCha8Rng,
    stats: StationStats,
}

impl StationState {
    fn level(&self, kind: FuelKind) -> u32 {
        match kind {
            FuelKind::Nitrogen => self.nitrogen,
            FuelKind::Quantum => self.quantum,
        }
    }

    fn can_dock(&self, order: FuelLoad) -> bool {
        self.free_slots >= 1 && self.nitrogen >= order.nitrogen && self.quantum >= order.quantum
    }
}

impl Station {
    /// Build a station with full docking bays and `consumer_trips` outstanding
    /// consumer withdrawals.
    pub fn new(config: StationConfig, consumer_trips: u64) -> Self {
        let state = StationState {
            nitrogen: config.initial_level(FuelKind::Nitrogen),
            quantum: config.initial_level(FuelKind::Quantum),
            free_slots: config.docking_slots,
            remaining_consumer_trips: consumer_trips,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            stats: StationStats::default(),
        };
        Self {
            config,
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Withdrawals
    // -----------------------------------------------------------------------

    /// Dock, withdraw `order`, spend the fill time docked, then undock.
    ///
    /// Blocks until a slot is free and both pools hold at least the requested
    /// amounts. The amounts are not reserved at admission, so by the time the
    /// withdrawal runs another vehicle may have drained a pool; the returned
    /// load is what was actually received and may be smaller than `order`.
    pub fn request_fuel(&self, vehicle: VehicleId, order: FuelLoad) -> FuelLoad {
        let fill_time = self.admit(vehicle, order);
        let received = self.withdraw(vehicle, order);
        thread::sleep(fill_time);
        self.depart(vehicle);
        received
    }

    /// Wait for the admission condition, then take a docking slot.
    /// Returns the fill time drawn for this visit.
    pub(crate) fn admit(&self, vehicle: VehicleId, order: FuelLoad) -> Duration {
        let mut state = self.state.lock();
        tracing::info!(
            %vehicle,
            nitrogen = order.nitrogen,
            quantum = order.quantum,
            station_nitrogen = state.nitrogen,
            station_quantum = state.quantum,
            free_slots = state.free_slots,
            remaining_trips = state.remaining_consumer_trips,
            "requests fuel"
        );

        let mut waited = false;
        while !state.can_dock(order) {
            if !waited {
                waited = true;
                state.stats.admission_waits += 1;
            }
            tracing::debug!(%vehicle, "waiting to dock");
            self.changed.wait(&mut state);
        }

        state.free_slots -= 1;
        state.stats.admissions += 1;
        self.config.fill_time_ms.sample(&mut state.rng)
    }

    /// Drain up to `order` from the pools, flooring each at zero.
    pub(crate) fn withdraw(&self, vehicle: VehicleId, order: FuelLoad) -> FuelLoad {
        let mut state = self.state.lock();
        let received = FuelLoad::new(
            order.nitrogen.min(state.nitrogen),
            order.quantum.min(state.quantum),
        );
        state.nitrogen -= received.nitrogen;
        state.quantum -= received.quantum;

        let shortfall = order.total() - received.total();
        state.stats.nitrogen_withdrawn += u64::from(received.nitrogen);
        state.stats.quantum_withdrawn += u64::from(received.quantum);
        state.stats.shortfall += shortfall;

        if shortfall > 0 {
            tracing::warn!(
                %vehicle,
                requested_nitrogen = order.nitrogen,
                requested_quantum = order.quantum,
                nitrogen = received.nitrogen,
                quantum = received.quantum,
                "pool drained after admission, partial fill"
            );
        }
        tracing::info!(
            %vehicle,
            nitrogen = received.nitrogen,
            quantum = received.quantum,
            free_slots = state.free_slots,
            "filling up tank"
        );
        received
    }

    /// Release the docking slot and wake every waiter.
    pub(crate) fn depart(&self, vehicle: VehicleId) {
        let mut state = self.state.lock();
        state.free_slots += 1;
        if vehicle.is_supplier() {
            state.stats.supplier_fills += 1;
        } else {
            state.remaining_consumer_trips = state.remaining_consumer_trips.saturating_sub(1);
            state.stats.consumer_fills += 1;
        }
        tracing::info!(
            %vehicle,
            station_nitrogen = state.nitrogen,
            station_quantum = state.quantum,
            free_slots = state.free_slots,
            remaining_trips = state.remaining_consumer_trips,
            "finished filling up"
        );
        self.changed.notify_all();
    }

    // -----------------------------------------------------------------------
    // Deliveries
    // -----------------------------------------------------------------------

    /// Deposit `batch` once the pool(s) selected by the configured
    /// [`DeliveryCheck`] have room for it.
    ///
    /// The whole call runs under the station lock, including the deposit time.
    /// While waiting for room the supplier re-polls every
    /// `delivery_poll_ms`; if all consumer trips are done by then the batch is
    /// dropped and [`DeliveryOutcome::Abandoned`] is returned.
    pub fn deliver_fuel(&self, vehicle: VehicleId, batch: FuelLoad) -> DeliveryOutcome {
        let mut state = self.state.lock();
        tracing::info!(
            %vehicle,
            fuel = %batch.dominant(),
            amount = batch.amount(batch.dominant()),
            "waiting to deposit"
        );

        let poll = Duration::from_millis(self.config.delivery_poll_ms);
        while !self.has_room_for(&state, batch) {
            if state.remaining_consumer_trips == 0 {
                state.stats.abandoned_deliveries += 1;
                tracing::warn!(%vehicle, "all consumer trips done, leaving without depositing");
                return DeliveryOutcome::Abandoned;
            }
            if self.changed.wait_for(&mut state, poll).timed_out() {
                state.stats.delivery_timeouts += 1;
                tracing::debug!(%vehicle, "delivery wait timed out, re-checking");
            }
        }

        state.nitrogen = state.nitrogen.saturating_add(batch.nitrogen);
        state.quantum = state.quantum.saturating_add(batch.quantum);
        state.stats.deliveries += 1;
        state.stats.nitrogen_delivered += u64::from(batch.nitrogen);
        state.stats.quantum_delivered += u64::from(batch.quantum);
        tracing::info!(
            %vehicle,
            nitrogen = batch.nitrogen,
            quantum = batch.quantum,
            station_nitrogen = state.nitrogen,
            station_quantum = state.quantum,
            "deposits fuel"
        );

        // Depositing happens with the lock held.
        thread::sleep(Duration::from_millis(self.config.deposit_time_ms));
        self.changed.notify_all();
        DeliveryOutcome::Delivered
    }

    fn has_room_for(&self, state: &StationState, batch: FuelLoad) -> bool {
        let fits = |kind: FuelKind| {
            self.config
                .capacity(kind)
                .saturating_sub(state.level(kind))
                >= batch.amount(kind)
        };
        match self.config.delivery_check {
            DeliveryCheck::Dominant => fits(batch.dominant()),
            DeliveryCheck::BothPools => FuelKind::ALL.into_iter().all(fits),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn remaining_consumer_trips(&self) -> u64 {
        self.state.lock().remaining_consumer_trips
    }

    pub fn snapshot(&self) -> StationSnapshot {
        let state = self.state.lock();
        StationSnapshot {
            nitrogen: state.nitrogen,
            quantum: state.quantum,
            free_slots: state.free_slots,
            max_slots: self.config.docking_slots,
            remaining_consumer_trips: state.remaining_consumer_trips,
        }
    }

    pub fn stats(&self) -> StationStats {
        self.state.lock().stats
    }
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
