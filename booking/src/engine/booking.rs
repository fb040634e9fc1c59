//! Booking a seat.

use super::guard::{finish, with_slot_locks, within};
use super::{EligibilityGate, trace_outcome};
use crate::environment::BookingEnvironment;
use crate::error::{BookingError, Result};
use crate::providers::{CandidateRepository, Notifier, SlotLock, SlotRepository, SlotTransaction};
use crate::state::{Assignment, BookRequest, Eligibility, InterviewResult, Slot};
use interview_booking_core::environment::Clock;
use interview_booking_core::{CandidateId, Round, RoundOutcome};
use tokio::time::Instant;

/// Candidate-facing booking operations.
///
/// Stateless between requests: every call reads slot and candidate state
/// fresh from the repositories.
///
/// # Example
///
/// ```no_run
/// use interview_booking::{BookRequest, BookingEngine, BookingEnvironment, BookingConfig};
/// use interview_booking::mocks::{MockBookingStore, MockNotifier, MockSlotLock};
/// use interview_booking_core::{CandidateId, SlotId, Track};
/// use interview_booking_core::environment::SystemClock;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockBookingStore::new();
/// let env = BookingEnvironment::new(
///     MockSlotLock::new(),
///     store.clone(),
///     store,
///     MockNotifier::new(),
///     SystemClock,
///     BookingConfig::default(),
/// );
/// let engine = BookingEngine::new(env);
/// engine.book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go }).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BookingEngine<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone,
    K: Clock + Clone,
{
    pub(super) env: BookingEnvironment<L, S, C, N, K>,
    pub(super) gate: EligibilityGate<C>,
}

impl<L, S, C, N, K> BookingEngine<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone,
    K: Clock + Clone,
{
    /// Create an engine over an environment.
    #[must_use]
    pub fn new(env: BookingEnvironment<L, S, C, N, K>) -> Self {
        let gate = EligibilityGate::new(env.candidates.clone());
        Self { env, gate }
    }

    /// The injected dependencies.
    #[must_use]
    pub const fn environment(&self) -> &BookingEnvironment<L, S, C, N, K> {
        &self.env
    }

    pub(super) fn deadline(&self) -> Instant {
        Instant::now() + self.env.config.request_timeout
    }

    /// Book a seat in a slot.
    ///
    /// Under the slot lock: the slot must exist, must not have started,
    /// must have a free seat, the candidate must be eligible for its round
    /// and must not already hold a booking. The seat and the assignment are
    /// then written in one transaction whose guarded increment settles any
    /// race for the last seat.
    ///
    /// # Errors
    ///
    /// - `LockBusy` if another request holds the slot
    /// - `SlotNotFound`, `BookingWindowClosed`, `CapacityExceeded`
    /// - `RoundNotEligible` if the previous round was not passed
    /// - `RoundAlreadyDecided` if the slot's round already has a final outcome
    /// - `CandidateNotFound` if the candidate record does not exist
    /// - `AlreadyBooked` if the candidate holds an active assignment
    /// - `Timeout`, `StorageUnavailable`, `LockServiceUnavailable` on
    ///   infrastructure failure
    pub async fn book(&self, candidate: CandidateId, request: BookRequest) -> Result<()> {
        let deadline = self.deadline();
        let result = with_slot_locks(
            &self.env.lock,
            &self.env.config,
            &[request.slot],
            deadline,
            self.book_locked(candidate, request, deadline),
        )
        .await;

        trace_outcome("book", candidate, Some(request.slot), &result);
        result
    }

    async fn book_locked(
        &self,
        candidate: CandidateId,
        request: BookRequest,
        deadline: Instant,
    ) -> Result<()> {
        let slot = within(deadline, self.env.slots.get_slot(request.slot)).await?;

        if slot.booking_closed(self.env.clock.now()) {
            return Err(BookingError::BookingWindowClosed);
        }
        if slot.is_full() {
            return Err(BookingError::CapacityExceeded);
        }

        self.ensure_eligible(candidate, slot.round, deadline).await?;

        match within(deadline, self.env.slots.find_assignment_by_candidate(candidate)).await {
            Ok(_) => return Err(BookingError::AlreadyBooked),
            Err(BookingError::AssignmentNotFound) => {}
            Err(e) => return Err(e),
        }

        let mut tx = self.env.slots.begin().await?;
        let outcome = async {
            tx.increment_occupied(slot.id, 1).await?;
            tx.create_assignment(candidate, slot.id, slot.round, request.track)
                .await
        }
        .await;

        finish(tx, outcome).await.map(|_| ())
    }

    pub(super) async fn ensure_eligible(
        &self,
        candidate: CandidateId,
        round: Round,
        deadline: Instant,
    ) -> Result<()> {
        match within(deadline, self.gate.is_eligible_for_round(candidate, round)).await? {
            Eligibility::Eligible => Ok(()),
            Eligibility::Ineligible { required, outcome } => {
                tracing::debug!(
                    candidate_id = %candidate,
                    round = %round,
                    required_round = %required,
                    outcome = ?outcome,
                    "Prerequisite round not passed"
                );
                Err(BookingError::RoundNotEligible)
            }
            Eligibility::Decided { outcome } => {
                tracing::debug!(
                    candidate_id = %candidate,
                    round = %round,
                    outcome = ?outcome,
                    "Round already decided"
                );
                Err(BookingError::RoundAlreadyDecided)
            }
        }
    }

    /// The candidate's active booking and its slot, if any.
    ///
    /// # Errors
    ///
    /// Returns error if a repository read fails or the deadline passes.
    pub async fn current_booking(&self, candidate: CandidateId) -> Result<Option<(Assignment, Slot)>> {
        let deadline = self.deadline();
        let assignment =
            match within(deadline, self.env.slots.find_assignment_by_candidate(candidate)).await {
                Ok(assignment) => assignment,
                Err(BookingError::AssignmentNotFound) => return Ok(None),
                Err(e) => return Err(e),
            };

        let slot = within(deadline, self.env.slots.get_slot(assignment.slot_id)).await?;
        Ok(Some((assignment, slot)))
    }

    /// Slots of a round, by start time.
    ///
    /// # Errors
    ///
    /// Returns error if the repository read fails or the deadline passes.
    pub async fn list_slots(&self, round: Round) -> Result<Vec<Slot>> {
        within(self.deadline(), self.env.slots.list_slots(round)).await
    }

    /// The candidate's outcome for `round`.
    ///
    /// # Errors
    ///
    /// - `CandidateNotFound` if the candidate record does not exist
    /// - `Timeout`, `StorageUnavailable`
    pub async fn result(&self, candidate: CandidateId, round: Round) -> Result<RoundOutcome> {
        let record = within(self.deadline(), self.env.candidates.get_candidate(candidate)).await?;
        Ok(record.outcome(round))
    }

    /// Every decision recorded for the candidate, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the repository read fails or the deadline passes.
    pub async fn result_history(&self, candidate: CandidateId) -> Result<Vec<InterviewResult>> {
        within(self.deadline(), self.env.candidates.result_history(candidate)).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::BookingConfig;
    use crate::mocks::{MockBookingStore, MockNotifier, MockSlotLock, candidate};
    use chrono::Duration;
    use interview_booking_core::{RoundOutcome, SlotId, Track};
    use interview_booking_testing::{FixedClock, test_clock};

    type Engine = BookingEngine<MockSlotLock, MockBookingStore, MockBookingStore, MockNotifier, FixedClock>;

    fn setup() -> (Engine, MockBookingStore, MockSlotLock) {
        let store = MockBookingStore::new();
        let lock = MockSlotLock::new();
        let now = test_clock().now();
        for (id, round, capacity) in [(1, Round::First, 2), (2, Round::Second, 2)] {
            store
                .insert_slot(Slot {
                    id: SlotId(id),
                    round,
                    start_time: now + Duration::days(1),
                    end_time: now + Duration::days(1) + Duration::hours(1),
                    occupied: 0,
                    capacity,
                })
                .unwrap();
        }
        store
            .insert_candidate(candidate(7, RoundOutcome::NotInterviewed, RoundOutcome::NotInterviewed))
            .unwrap();

        let env = BookingEnvironment::new(
            lock.clone(),
            store.clone(),
            store.clone(),
            MockNotifier::new(),
            test_clock(),
            BookingConfig::default(),
        );
        (BookingEngine::new(env), store, lock)
    }

    fn request(slot: i64) -> BookRequest {
        BookRequest { slot: SlotId(slot), track: Track::Backend }
    }

    #[tokio::test]
    async fn test_book_takes_a_seat() {
        let (engine, store, lock) = setup();

        engine.book(CandidateId(7), request(1)).await.unwrap();

        assert_eq!(store.slot(SlotId(1)).unwrap().unwrap().occupied, 1);
        let (assignment, slot) = engine.current_booking(CandidateId(7)).await.unwrap().unwrap();
        assert_eq!(slot.id, SlotId(1));
        assert_eq!(assignment.round, Round::First);
        assert_eq!(assignment.track, Track::Backend);
        assert!(!lock.is_held("lock:slot:1").unwrap());
    }

    #[tokio::test]
    async fn test_book_rejects_second_booking() {
        let (engine, store, _) = setup();
        engine.book(CandidateId(7), request(1)).await.unwrap();

        assert_eq!(
            engine.book(CandidateId(7), request(1)).await,
            Err(BookingError::AlreadyBooked)
        );
        assert_eq!(store.slot(SlotId(1)).unwrap().unwrap().occupied, 1);
    }

    #[tokio::test]
    async fn test_book_unknown_slot() {
        let (engine, _, _) = setup();
        assert_eq!(
            engine.book(CandidateId(7), request(99)).await,
            Err(BookingError::SlotNotFound)
        );
    }

    #[tokio::test]
    async fn test_book_while_slot_locked_is_busy() {
        let (engine, store, lock) = setup();
        let _held = lock
            .acquire("lock:slot:1", std::time::Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();

        let result = engine.book(CandidateId(7), request(1)).await;

        assert_eq!(result, Err(BookingError::LockBusy));
        assert!(result.unwrap_err().is_transient());
        assert_eq!(store.slot(SlotId(1)).unwrap().unwrap().occupied, 0);
    }

    #[tokio::test]
    async fn test_book_after_start_is_closed() {
        let (engine, store, _) = setup();
        let now = test_clock().now();
        store
            .insert_slot(Slot {
                id: SlotId(3),
                round: Round::First,
                start_time: now - Duration::minutes(1),
                end_time: now + Duration::hours(1),
                occupied: 0,
                capacity: 5,
            })
            .unwrap();

        assert_eq!(
            engine.book(CandidateId(7), request(3)).await,
            Err(BookingError::BookingWindowClosed)
        );
    }

    #[tokio::test]
    async fn test_result_reads_the_round_outcome() {
        let (engine, store, _) = setup();
        store
            .insert_candidate(candidate(8, RoundOutcome::Passed, RoundOutcome::Undecided))
            .unwrap();

        assert_eq!(engine.result(CandidateId(7), Round::First).await, Ok(RoundOutcome::NotInterviewed));
        assert_eq!(engine.result(CandidateId(8), Round::First).await, Ok(RoundOutcome::Passed));
        assert_eq!(engine.result(CandidateId(8), Round::Second).await, Ok(RoundOutcome::Undecided));
        assert_eq!(
            engine.result(CandidateId(404), Round::First).await,
            Err(BookingError::CandidateNotFound)
        );
        assert!(engine.result_history(CandidateId(8)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decided_candidate_cannot_book_the_round_again() {
        let (engine, store, _) = setup();
        store
            .insert_candidate(candidate(8, RoundOutcome::Failed, RoundOutcome::NotInterviewed))
            .unwrap();

        assert_eq!(
            engine.book(CandidateId(8), request(1)).await,
            Err(BookingError::RoundAlreadyDecided)
        );
        assert_eq!(store.slot(SlotId(1)).unwrap().unwrap().occupied, 0);
    }

    #[tokio::test]
    async fn test_list_slots_by_round() {
        let (engine, _, _) = setup();
        let first = engine.list_slots(Round::First).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, SlotId(1));
    }
}
