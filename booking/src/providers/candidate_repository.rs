//! Candidate repository trait.

use crate::error::Result;
use crate::state::{Candidate, InterviewResult};
use interview_booking_core::{CandidateId, Round};

/// Read access to candidate records and their round outcomes.
///
/// Outcomes are written through [`SlotTransaction::record_outcome`] so the
/// decision and the assignment it completes commit together.
///
/// [`SlotTransaction::record_outcome`]: crate::providers::SlotTransaction::record_outcome
pub trait CandidateRepository: Send + Sync {
    /// Get a candidate.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Candidate not found → `BookingError::CandidateNotFound`
    /// - Database error → `BookingError::StorageUnavailable`
    fn get_candidate(
        &self,
        candidate: CandidateId,
    ) -> impl std::future::Future<Output = Result<Candidate>> + Send;

    /// Candidates whose outcome for `round` is `Passed`, by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn passed_candidates(
        &self,
        round: Round,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>>> + Send;

    /// Recorded decisions for a candidate, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    fn result_history(
        &self,
        candidate: CandidateId,
    ) -> impl std::future::Future<Output = Result<Vec<InterviewResult>>> + Send;
}
