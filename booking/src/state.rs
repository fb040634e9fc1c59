//! Booking data model.
//!
//! These are transient per-request views of persisted rows. Nothing here is
//! cached across requests.

use crate::error::{BookingError, Result};
use chrono::{DateTime, Utc};
use interview_booking_core::{
    AdminId, AssignmentId, AssignmentStatus, CandidateId, Round, RoundOutcome, SlotId, Track,
};
use serde::{Deserialize, Serialize};

/// A bookable interview window with a seat quota for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot ID.
    pub id: SlotId,
    /// Round this slot interviews for.
    pub round: Round,
    /// Interview start. Booking closes once this has passed.
    pub start_time: DateTime<Utc>,
    /// Interview end.
    pub end_time: DateTime<Utc>,
    /// Seats taken.
    pub occupied: u32,
    /// Seats available in total.
    pub capacity: u32,
}

impl Slot {
    /// Returns `true` when no seat is left.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }

    /// Seats still free.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }

    /// Returns `true` once `now` is past the start time.
    #[must_use]
    pub fn booking_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.start_time
    }
}

/// Validated parameters for a new slot.
///
/// Can only be built through [`NewSlot::new`], so a repository receiving one
/// may insert it without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    round: Round,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    capacity: u32,
}

impl NewSlot {
    /// Validate slot parameters.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidSlot`] if `start >= end`, the round is
    /// not 1 or 2, or `capacity` is outside `1..=max_capacity`.
    pub fn new(
        round: i16,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: u32,
        max_capacity: u32,
    ) -> Result<Self> {
        let round = Round::try_from(round)
            .map_err(|e| BookingError::InvalidSlot(e.to_string()))?;

        if start_time >= end_time {
            return Err(BookingError::InvalidSlot(format!(
                "start {start_time} is not before end {end_time}"
            )));
        }

        if capacity == 0 || capacity > max_capacity {
            return Err(BookingError::InvalidSlot(format!(
                "capacity {capacity} outside 1..={max_capacity}"
            )));
        }

        Ok(Self {
            round,
            start_time,
            end_time,
            capacity,
        })
    }

    /// Round.
    #[must_use]
    pub const fn round(&self) -> Round {
        self.round
    }

    /// Start time.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// End time.
    #[must_use]
    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Seat quota.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Binding of one candidate to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assignment ID.
    pub id: AssignmentId,
    /// Booked candidate.
    pub candidate_id: CandidateId,
    /// Booked slot.
    pub slot_id: SlotId,
    /// Copy of the slot's round taken at booking time.
    pub round: Round,
    /// Preferred track.
    pub track: Track,
    /// Lifecycle state.
    pub status: AssignmentStatus,
    /// When the booking was made.
    pub created_at: DateTime<Utc>,
    /// Last slot move, cancellation or completion.
    pub updated_at: DateTime<Utc>,
}

/// Candidate record as far as booking cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate ID.
    pub id: CandidateId,
    /// Display name.
    pub name: String,
    /// Where result notices go.
    pub email: String,
    /// First-round outcome.
    pub round1: RoundOutcome,
    /// Second-round outcome.
    pub round2: RoundOutcome,
}

impl Candidate {
    /// Outcome recorded for `round`.
    #[must_use]
    pub const fn outcome(&self, round: Round) -> RoundOutcome {
        match round {
            Round::First => self.round1,
            Round::Second => self.round2,
        }
    }
}

/// One recorded decision, kept as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewResult {
    /// Candidate the decision is about.
    pub candidate_id: CandidateId,
    /// Round decided.
    pub round: Round,
    /// Decision.
    pub outcome: RoundOutcome,
    /// Administrator who recorded it.
    pub admin_id: AdminId,
    /// When it was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Opaque proof of lock ownership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(pub String);

impl LockToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Result of the eligibility gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The candidate may book the round.
    Eligible,
    /// The prerequisite round has a different outcome than `Passed`.
    Ineligible {
        /// Round that must be passed first.
        required: Round,
        /// What was recorded for it.
        outcome: RoundOutcome,
    },
    /// The round itself already has a `Passed` or `Failed` outcome.
    Decided {
        /// What was recorded for the round.
        outcome: RoundOutcome,
    },
}

impl Eligibility {
    /// Returns `true` for [`Eligibility::Eligible`].
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Body of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    /// Slot to book.
    pub slot: SlotId,
    /// Preferred track.
    #[serde(default)]
    pub track: Track,
}

/// Body of a slot change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebookRequest {
    /// Slot to move to.
    pub new_slot: SlotId,
    /// Track to record on the moved assignment.
    #[serde(default)]
    pub track: Track,
}

/// A slot and everyone booked into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotRoster {
    /// The slot.
    pub slot: Slot,
    /// Active and completed assignments, oldest first.
    pub assignments: Vec<Assignment>,
}

/// What to send when publishing results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Publication {
    /// The standard congratulation notice.
    #[default]
    Default,
    /// Administrator-written text.
    Custom {
        /// Subject line; the standard subject when absent.
        subject: Option<String>,
        /// Message body.
        body: String,
    },
}

/// Outcome decision to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// Candidate decided on.
    pub candidate: CandidateId,
    /// Round decided.
    pub round: Round,
    /// Decision.
    pub outcome: RoundOutcome,
    /// Administrator recording it.
    pub admin: AdminId,
    /// Time of recording.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Duration;
    use interview_booking_testing::test_clock;
    use interview_booking_core::environment::Clock;

    #[test]
    fn test_new_slot_validation() {
        let start = test_clock().now();
        let end = start + Duration::hours(1);

        assert!(NewSlot::new(1, start, end, 10, 50).is_ok());
        assert!(matches!(NewSlot::new(3, start, end, 10, 50), Err(BookingError::InvalidSlot(_))));
        assert!(matches!(NewSlot::new(1, end, start, 10, 50), Err(BookingError::InvalidSlot(_))));
        assert!(matches!(NewSlot::new(1, start, start, 10, 50), Err(BookingError::InvalidSlot(_))));
        assert!(matches!(NewSlot::new(2, start, end, 0, 50), Err(BookingError::InvalidSlot(_))));
        assert!(matches!(NewSlot::new(2, start, end, 51, 50), Err(BookingError::InvalidSlot(_))));
        assert_eq!(NewSlot::new(2, start, end, 50, 50).unwrap().capacity(), 50);
    }

    #[test]
    fn test_booking_closes_after_start() {
        let start = test_clock().now();
        let slot = Slot {
            id: SlotId(1),
            round: Round::First,
            start_time: start,
            end_time: start + Duration::hours(1),
            occupied: 0,
            capacity: 1,
        };

        assert!(!slot.booking_closed(start - Duration::seconds(1)));
        assert!(!slot.booking_closed(start));
        assert!(slot.booking_closed(start + Duration::seconds(1)));
    }

    #[test]
    fn test_request_track_defaults_to_undecided() {
        let request: RebookRequest = serde_json::from_str(r#"{"new_slot":4}"#).unwrap();
        assert_eq!(request.new_slot, SlotId(4));
        assert_eq!(request.track, Track::Undecided);
    }

    #[test]
    fn test_publication_wire_shape() {
        let custom: Publication =
            serde_json::from_str(r#"{"type":"custom","subject":null,"body":"hi"}"#).unwrap();
        assert_eq!(custom, Publication::Custom { subject: None, body: "hi".into() });

        let default: Publication = serde_json::from_str(r#"{"type":"default"}"#).unwrap();
        assert_eq!(default, Publication::Default);
    }
}
