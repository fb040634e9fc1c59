//! Round eligibility gate.

use crate::error::Result;
use crate::providers::CandidateRepository;
use crate::state::Eligibility;
use interview_booking_core::{CandidateId, Round};

/// Decides whether a candidate may book a round.
///
/// A round whose own outcome is `Passed` or `Failed` is closed to the
/// candidate. Later rounds also require the previous round to be `Passed`.
/// The candidate record is read fresh on every call.
#[derive(Debug, Clone)]
pub struct EligibilityGate<C> {
    candidates: C,
}

impl<C: CandidateRepository> EligibilityGate<C> {
    /// Create a gate over a candidate repository.
    #[must_use]
    pub const fn new(candidates: C) -> Self {
        Self { candidates }
    }

    /// Check `candidate` against `round`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Candidate not found → `BookingError::CandidateNotFound`
    /// - Database error → `BookingError::StorageUnavailable`
    pub async fn is_eligible_for_round(
        &self,
        candidate: CandidateId,
        round: Round,
    ) -> Result<Eligibility> {
        let record = self.candidates.get_candidate(candidate).await?;

        let own = record.outcome(round);
        if own.is_decided() {
            return Ok(Eligibility::Decided { outcome: own });
        }

        match round.previous() {
            Some(required) if !record.outcome(required).is_passed() => Ok(Eligibility::Ineligible {
                required,
                outcome: record.outcome(required),
            }),
            _ => Ok(Eligibility::Eligible),
        }
    }
}
