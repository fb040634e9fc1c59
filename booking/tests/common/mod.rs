//! Shared fixtures for the booking integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use chrono::Duration;
use interview_booking::mocks::{MockBookingStore, MockNotifier, MockSlotLock, candidate};
use interview_booking::{
    AdminService, BookRequest, BookingConfig, BookingEngine, BookingEnvironment, BookingError,
    Result, Slot,
};
use interview_booking_core::environment::Clock;
use interview_booking_core::{CandidateId, Round, RoundOutcome, SlotId, Track};
use interview_booking_testing::{AdjustableClock, init_tracing, test_clock};

pub type TestEnv =
    BookingEnvironment<MockSlotLock, MockBookingStore, MockBookingStore, MockNotifier, AdjustableClock>;
pub type TestEngine =
    BookingEngine<MockSlotLock, MockBookingStore, MockBookingStore, MockNotifier, AdjustableClock>;
pub type TestAdmin =
    AdminService<MockSlotLock, MockBookingStore, MockBookingStore, MockNotifier, AdjustableClock>;

/// Engine, admin service and handles on every mock behind them.
pub struct Fixture {
    pub engine: TestEngine,
    pub admin: TestAdmin,
    pub store: MockBookingStore,
    pub lock: MockSlotLock,
    pub notifier: MockNotifier,
    pub clock: AdjustableClock,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let store = MockBookingStore::new();
        let lock = MockSlotLock::new();
        let notifier = MockNotifier::new();
        let clock = AdjustableClock::new(test_clock().now());
        let env: TestEnv = BookingEnvironment::new(
            lock.clone(),
            store.clone(),
            store.clone(),
            notifier.clone(),
            clock.clone(),
            BookingConfig::default(),
        );

        Self {
            engine: BookingEngine::new(env.clone()),
            admin: AdminService::new(env),
            store,
            lock,
            notifier,
            clock,
        }
    }

    /// Add a slot starting one day from now.
    pub fn slot(&self, id: i64, round: Round, capacity: u32) -> SlotId {
        let start = self.clock.now() + Duration::days(1);
        self.store
            .insert_slot(Slot {
                id: SlotId(id),
                round,
                start_time: start,
                end_time: start + Duration::hours(1),
                occupied: 0,
                capacity,
            })
            .unwrap();
        SlotId(id)
    }

    pub fn candidate(&self, id: i64, round1: RoundOutcome) -> CandidateId {
        self.store
            .insert_candidate(candidate(id, round1, RoundOutcome::NotInterviewed))
            .unwrap();
        CandidateId(id)
    }

    pub fn occupied(&self, slot: SlotId) -> u32 {
        self.store.slot(slot).unwrap().unwrap().occupied
    }
}

pub fn request(slot: SlotId) -> BookRequest {
    BookRequest { slot, track: Track::Backend }
}

/// Book, retrying while the slot lock is contended.
pub async fn book_retrying(engine: &TestEngine, candidate: CandidateId, slot: SlotId) -> Result<()> {
    for _ in 0..10_000 {
        match engine.book(candidate, request(slot)).await {
            Err(BookingError::LockBusy) => tokio::task::yield_now().await,
            other => return other,
        }
    }
    Err(BookingError::LockBusy)
}
