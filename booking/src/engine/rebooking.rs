//! Cancelling and moving a booking.

use super::booking::BookingEngine;
use super::guard::{finish, with_slot_locks, within};
use super::trace_outcome;
use crate::error::{BookingError, Result};
use crate::providers::{CandidateRepository, Notifier, SlotLock, SlotRepository, SlotTransaction};
use crate::state::RebookRequest;
use interview_booking_core::environment::Clock;
use interview_booking_core::{CandidateId, SlotId};
use tokio::time::Instant;

impl<L, S, C, N, K> BookingEngine<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone,
    K: Clock + Clone,
{
    /// Cancel the candidate's active booking and free its seat.
    ///
    /// The assignment is read once to find the slot, then read again under
    /// that slot's lock. If it moved in between, the call fails with
    /// `LockBusy` and the caller retries.
    ///
    /// # Errors
    ///
    /// - `AssignmentNotFound` if the candidate holds no active booking
    /// - `LockBusy` if the slot is locked or the booking moved concurrently
    /// - `StorageInconsistency` if the slot counter is already zero
    /// - `Timeout`, `StorageUnavailable`, `LockServiceUnavailable`
    pub async fn cancel(&self, candidate: CandidateId) -> Result<()> {
        let deadline = self.deadline();
        let current = within(deadline, self.env.slots.find_assignment_by_candidate(candidate)).await;
        let slot = current.as_ref().ok().map(|a| a.slot_id);

        let result = match current {
            Ok(current) => {
                with_slot_locks(
                    &self.env.lock,
                    &self.env.config,
                    &[current.slot_id],
                    deadline,
                    self.cancel_locked(candidate, current.slot_id, deadline),
                )
                .await
            }
            Err(e) => Err(e),
        };

        trace_outcome("cancel", candidate, slot, &result);
        result
    }

    async fn cancel_locked(
        &self,
        candidate: CandidateId,
        locked: SlotId,
        deadline: Instant,
    ) -> Result<()> {
        let current = within(deadline, self.env.slots.find_assignment_by_candidate(candidate)).await?;
        if current.slot_id != locked {
            return Err(BookingError::LockBusy);
        }

        let mut tx = self.env.slots.begin().await?;
        let outcome = async {
            let cancelled = tx.delete_assignment(candidate).await?;
            tx.increment_occupied(cancelled.slot_id, -1).await
        }
        .await;

        finish(tx, outcome).await
    }

    /// Move the candidate's active booking to another slot of the same round.
    ///
    /// Both slot locks are held, in ascending order, for the whole move. The
    /// old seat is freed, the new seat taken and the assignment repointed in
    /// one transaction: either all three happen or none do. Rebooking onto
    /// the current slot only updates the track.
    ///
    /// # Errors
    ///
    /// - `AssignmentNotFound` if the candidate holds no active booking
    /// - `SlotNotFound`, `BookingWindowClosed`, `CapacityExceeded` for the
    ///   target slot
    /// - `RoundMismatch` if the target belongs to a different round
    /// - `RoundNotEligible` if the target round is gated
    /// - `RoundAlreadyDecided` if the target round already has a final outcome
    /// - `LockBusy` if either slot is locked or the booking moved concurrently
    /// - `Timeout`, `StorageUnavailable`, `LockServiceUnavailable`
    pub async fn rebook(&self, candidate: CandidateId, request: RebookRequest) -> Result<()> {
        let deadline = self.deadline();
        let current = within(deadline, self.env.slots.find_assignment_by_candidate(candidate)).await;

        let result = match current {
            Ok(current) => {
                with_slot_locks(
                    &self.env.lock,
                    &self.env.config,
                    &[current.slot_id, request.new_slot],
                    deadline,
                    self.rebook_locked(candidate, current.slot_id, request, deadline),
                )
                .await
            }
            Err(e) => Err(e),
        };

        trace_outcome("rebook", candidate, Some(request.new_slot), &result);
        result
    }

    async fn rebook_locked(
        &self,
        candidate: CandidateId,
        locked: SlotId,
        request: RebookRequest,
        deadline: Instant,
    ) -> Result<()> {
        let current = within(deadline, self.env.slots.find_assignment_by_candidate(candidate)).await?;
        if current.slot_id != locked {
            return Err(BookingError::LockBusy);
        }

        let target = within(deadline, self.env.slots.get_slot(request.new_slot)).await?;
        if target.booking_closed(self.env.clock.now()) {
            return Err(BookingError::BookingWindowClosed);
        }
        if target.round != current.round {
            return Err(BookingError::RoundMismatch);
        }
        self.ensure_eligible(candidate, target.round, deadline).await?;

        if target.id == current.slot_id {
            let mut tx = self.env.slots.begin().await?;
            let outcome = tx
                .update_assignment_slot(candidate, target.id, request.track)
                .await;
            return finish(tx, outcome).await;
        }

        if target.is_full() {
            return Err(BookingError::CapacityExceeded);
        }

        let mut tx = self.env.slots.begin().await?;
        let outcome = async {
            tx.increment_occupied(current.slot_id, -1).await?;
            tx.increment_occupied(target.id, 1).await?;
            tx.update_assignment_slot(candidate, target.id, request.track)
                .await
        }
        .await;

        finish(tx, outcome).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::BookingConfig;
    use crate::environment::BookingEnvironment;
    use crate::mocks::{MockBookingStore, MockNotifier, MockSlotLock, candidate};
    use crate::state::{BookRequest, Slot};
    use chrono::Duration;
    use interview_booking_core::{Round, RoundOutcome, Track};
    use interview_booking_testing::{FixedClock, test_clock};

    type Engine = BookingEngine<MockSlotLock, MockBookingStore, MockBookingStore, MockNotifier, FixedClock>;

    fn slot(id: i64, round: Round, capacity: u32) -> Slot {
        let start = test_clock().now() + Duration::days(1);
        Slot {
            id: SlotId(id),
            round,
            start_time: start,
            end_time: start + Duration::hours(1),
            occupied: 0,
            capacity,
        }
    }

    fn setup() -> (Engine, MockBookingStore) {
        let store = MockBookingStore::new();
        store.insert_slot(slot(1, Round::First, 2)).unwrap();
        store.insert_slot(slot(2, Round::First, 1)).unwrap();
        store.insert_slot(slot(3, Round::Second, 2)).unwrap();
        store
            .insert_candidate(candidate(7, RoundOutcome::NotInterviewed, RoundOutcome::NotInterviewed))
            .unwrap();
        store
            .insert_candidate(candidate(8, RoundOutcome::NotInterviewed, RoundOutcome::NotInterviewed))
            .unwrap();

        let env = BookingEnvironment::new(
            MockSlotLock::new(),
            store.clone(),
            store.clone(),
            MockNotifier::new(),
            test_clock(),
            BookingConfig::default(),
        );
        (BookingEngine::new(env), store)
    }

    fn occupied(store: &MockBookingStore, id: i64) -> u32 {
        store.slot(SlotId(id)).unwrap().unwrap().occupied
    }

    #[tokio::test]
    async fn test_cancel_frees_the_seat() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go })
            .await
            .unwrap();

        engine.cancel(CandidateId(7)).await.unwrap();

        assert_eq!(occupied(&store, 1), 0);
        assert!(engine.current_booking(CandidateId(7)).await.unwrap().is_none());
        assert_eq!(
            engine.cancel(CandidateId(7)).await,
            Err(BookingError::AssignmentNotFound)
        );
    }

    #[tokio::test]
    async fn test_cancel_against_zero_counter_rolls_back() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go })
            .await
            .unwrap();
        store.insert_slot(slot(1, Round::First, 2)).unwrap();

        let result = engine.cancel(CandidateId(7)).await;

        assert!(matches!(result, Err(BookingError::StorageInconsistency(_))));
        assert_eq!(occupied(&store, 1), 0);
        let (assignment, _) = engine.current_booking(CandidateId(7)).await.unwrap().unwrap();
        assert!(assignment.status.is_active());
        assert!(!engine.environment().lock.is_held("lock:slot:1").unwrap());
    }

    #[tokio::test]
    async fn test_rebook_moves_the_seat() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go })
            .await
            .unwrap();

        engine
            .rebook(CandidateId(7), RebookRequest { new_slot: SlotId(2), track: Track::Java })
            .await
            .unwrap();

        assert_eq!(occupied(&store, 1), 0);
        assert_eq!(occupied(&store, 2), 1);
        let (assignment, _) = engine.current_booking(CandidateId(7)).await.unwrap().unwrap();
        assert_eq!(assignment.slot_id, SlotId(2));
        assert_eq!(assignment.track, Track::Java);
    }

    #[tokio::test]
    async fn test_rebook_into_full_slot_changes_nothing() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(8), BookRequest { slot: SlotId(2), track: Track::Go })
            .await
            .unwrap();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go })
            .await
            .unwrap();

        assert_eq!(
            engine
                .rebook(CandidateId(7), RebookRequest { new_slot: SlotId(2), track: Track::Go })
                .await,
            Err(BookingError::CapacityExceeded)
        );
        assert_eq!(occupied(&store, 1), 1);
        assert_eq!(occupied(&store, 2), 1);
    }

    #[tokio::test]
    async fn test_rebook_across_rounds_is_rejected() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go })
            .await
            .unwrap();

        assert_eq!(
            engine
                .rebook(CandidateId(7), RebookRequest { new_slot: SlotId(3), track: Track::Go })
                .await,
            Err(BookingError::RoundMismatch)
        );
        assert_eq!(occupied(&store, 1), 1);
        assert_eq!(occupied(&store, 3), 0);
    }

    #[tokio::test]
    async fn test_rebook_same_slot_updates_track_only() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(2), track: Track::Go })
            .await
            .unwrap();

        // Slot 2 is full, but the seat is already ours
        engine
            .rebook(CandidateId(7), RebookRequest { new_slot: SlotId(2), track: Track::Frontend })
            .await
            .unwrap();

        assert_eq!(occupied(&store, 2), 1);
        let (assignment, _) = engine.current_booking(CandidateId(7)).await.unwrap().unwrap();
        assert_eq!(assignment.track, Track::Frontend);
    }

    #[tokio::test]
    async fn test_failed_repoint_restores_both_counters() {
        let (engine, store) = setup();
        engine
            .book(CandidateId(7), BookRequest { slot: SlotId(1), track: Track::Go })
            .await
            .unwrap();
        store.fail_assignment_updates(true).unwrap();

        let result = engine
            .rebook(CandidateId(7), RebookRequest { new_slot: SlotId(2), track: Track::Go })
            .await;

        assert!(matches!(result, Err(BookingError::StorageUnavailable(_))));
        assert_eq!(occupied(&store, 1), 1);
        assert_eq!(occupied(&store, 2), 0);
        let (assignment, _) = engine.current_booking(CandidateId(7)).await.unwrap().unwrap();
        assert_eq!(assignment.slot_id, SlotId(1));
    }

    #[tokio::test]
    async fn test_rebook_without_booking() {
        let (engine, _) = setup();
        assert_eq!(
            engine
                .rebook(CandidateId(7), RebookRequest { new_slot: SlotId(2), track: Track::Go })
                .await,
            Err(BookingError::AssignmentNotFound)
        );
    }
}
