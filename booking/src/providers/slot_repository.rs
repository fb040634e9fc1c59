//! Slot repository traits.
//!
//! # Transactions
//!
//! Every mutation runs inside a [`SlotTransaction`] obtained from
//! [`SlotRepository::begin`]. Nothing becomes visible to other requests
//! until [`SlotTransaction::commit`]; dropping a transaction without
//! committing rolls it back.
//!
//! # Guarded updates
//!
//! The occupied counter is never written with a value computed by the caller.
//! [`SlotTransaction::increment_occupied`] applies a delta only if the result
//! stays within `[0, capacity]`, evaluated by the store at write time. This
//! keeps the capacity invariant intact even if two requests race past the
//! slot lock.

use crate::error::Result;
use crate::state::{Assignment, NewSlot, OutcomeRecord, Slot};
use interview_booking_core::{CandidateId, Round, SlotId, Track};

/// Slots and assignments.
///
/// # Example
///
/// ```no_run
/// use interview_booking::providers::{SlotRepository, SlotTransaction};
/// use interview_booking_core::{CandidateId, SlotId, Track};
///
/// # async fn example(repo: impl SlotRepository) -> Result<(), Box<dyn std::error::Error>> {
/// let slot = repo.get_slot(SlotId(1)).await?;
///
/// let mut tx = repo.begin().await?;
/// tx.increment_occupied(slot.id, 1).await?;
/// tx.create_assignment(CandidateId(7), slot.id, slot.round, Track::Go).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
pub trait SlotRepository: Send + Sync {
    /// Unit of work type.
    type Transaction: SlotTransaction;

    /// Start a transaction.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::StorageUnavailable` if no connection is available.
    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Transaction>> + Send;

    /// Insert a validated slot with zero occupied seats.
    ///
    /// # Errors
    ///
    /// Returns error if the database insert fails.
    fn create_slot(
        &self,
        slot: &NewSlot,
    ) -> impl std::future::Future<Output = Result<Slot>> + Send;

    /// Get a slot.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Slot not found → `BookingError::SlotNotFound`
    /// - Database error → `BookingError::StorageUnavailable`
    fn get_slot(&self, slot: SlotId) -> impl std::future::Future<Output = Result<Slot>> + Send;

    /// All slots of a round, by start time.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn list_slots(&self, round: Round)
    -> impl std::future::Future<Output = Result<Vec<Slot>>> + Send;

    /// The candidate's active assignment.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No active assignment → `BookingError::AssignmentNotFound`
    /// - Database error → `BookingError::StorageUnavailable`
    fn find_assignment_by_candidate(
        &self,
        candidate: CandidateId,
    ) -> impl std::future::Future<Output = Result<Assignment>> + Send;

    /// Active and completed assignments of a slot, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn list_slot_assignments(
        &self,
        slot: SlotId,
    ) -> impl std::future::Future<Output = Result<Vec<Assignment>>> + Send;
}

/// Mutations inside one storage transaction.
pub trait SlotTransaction: Send + Sized {
    /// Add `by` (possibly negative) to a slot's occupied count.
    ///
    /// Applies only if `occupied + by` stays within `[0, capacity]`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Slot not found → `BookingError::SlotNotFound`
    /// - Increment would pass capacity → `BookingError::CapacityExceeded`
    /// - Decrement would go below zero → `BookingError::StorageInconsistency`
    fn increment_occupied(
        &mut self,
        slot: SlotId,
        by: i32,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert an active assignment.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The candidate already has an active assignment → `BookingError::AlreadyBooked`
    /// - Candidate not found → `BookingError::CandidateNotFound`
    /// - Database error → `BookingError::StorageUnavailable`
    fn create_assignment(
        &mut self,
        candidate: CandidateId,
        slot: SlotId,
        round: Round,
        track: Track,
    ) -> impl std::future::Future<Output = Result<Assignment>> + Send;

    /// Mark the candidate's active assignment cancelled and return it.
    ///
    /// Callers pair this with a decrement of the assignment's slot.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::AssignmentNotFound` if there is no active assignment.
    fn delete_assignment(
        &mut self,
        candidate: CandidateId,
    ) -> impl std::future::Future<Output = Result<Assignment>> + Send;

    /// Point the candidate's active assignment at another slot.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::AssignmentNotFound` if there is no active assignment.
    fn update_assignment_slot(
        &mut self,
        candidate: CandidateId,
        new_slot: SlotId,
        new_track: Track,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Mark the candidate's active assignment for `round` completed.
    ///
    /// Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns error if the database update fails.
    fn complete_assignment(
        &mut self,
        candidate: CandidateId,
        round: Round,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Store a round outcome on the candidate and append it to the history.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Candidate not found → `BookingError::CandidateNotFound`
    /// - Database error → `BookingError::StorageUnavailable`
    fn record_outcome(
        &mut self,
        record: OutcomeRecord,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Make every mutation visible.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing is applied in that case.
    fn commit(self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Discard every mutation.
    ///
    /// # Errors
    ///
    /// Returns error if the store could not be reached; the store discards
    /// the transaction on its own in that case.
    fn rollback(self) -> impl std::future::Future<Output = Result<()>> + Send;
}
