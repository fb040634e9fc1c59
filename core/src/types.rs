//! Domain types for interview slot booking.
//!
//! Identifiers are thin newtypes over the database keys. The small closed
//! sets (rounds, tracks, outcomes, statuses) are stored as `SMALLINT`
//! columns, so each of them converts to and from `i16`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an interview slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub i64);

/// Identifier of an authenticated candidate, supplied by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub i64);

/// Unique identifier for an assignment row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub i64);

/// Identifier of the administrator recording a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdminId(pub i64);

macro_rules! display_id {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

display_id!(SlotId, CandidateId, AssignmentId, AdminId);

// ============================================================================
// Closed value sets
// ============================================================================

/// A stored value that is outside its closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid {kind} value: {value}")]
pub struct InvalidValue {
    /// Name of the value set.
    pub kind: &'static str,
    /// Offending raw value.
    pub value: i16,
}

/// Interview round. Rounds are taken in order: first, then second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Round {
    /// First-round interview.
    First,
    /// Second-round interview, gated by the first-round outcome.
    Second,
}

impl Round {
    /// All rounds in the order candidates take them.
    pub const ALL: [Self; 2] = [Self::First, Self::Second];

    /// Numeric round (1 or 2).
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }

    /// The round that must be passed before this one, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::First => None,
            Self::Second => Some(Self::First),
        }
    }
}

impl TryFrom<i16> for Round {
    type Error = InvalidValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            value => Err(InvalidValue { kind: "round", value }),
        }
    }
}

impl From<Round> for i16 {
    fn from(round: Round) -> Self {
        round.as_i16()
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

/// Track (direction) a candidate prefers to interview for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Track {
    /// No preference given.
    #[default]
    Undecided,
    /// Go.
    Go,
    /// Java.
    Java,
    /// Frontend.
    Frontend,
    /// Backend.
    Backend,
}

impl Track {
    /// Stored representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Undecided => 0,
            Self::Go => 1,
            Self::Java => 2,
            Self::Frontend => 3,
            Self::Backend => 4,
        }
    }
}

impl TryFrom<i16> for Track {
    type Error = InvalidValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Undecided),
            1 => Ok(Self::Go),
            2 => Ok(Self::Java),
            3 => Ok(Self::Frontend),
            4 => Ok(Self::Backend),
            value => Err(InvalidValue { kind: "track", value }),
        }
    }
}

impl From<Track> for i16 {
    fn from(track: Track) -> Self {
        track.as_i16()
    }
}

/// Outcome of one interview round for one candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum RoundOutcome {
    /// The candidate has not been interviewed for this round yet.
    #[default]
    NotInterviewed,
    /// The candidate passed.
    Passed,
    /// The candidate failed.
    Failed,
    /// Interviewed, decision pending.
    Undecided,
}

impl RoundOutcome {
    /// Stored representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::NotInterviewed => 0,
            Self::Passed => 1,
            Self::Failed => 2,
            Self::Undecided => 3,
        }
    }

    /// Returns `true` only for [`RoundOutcome::Passed`].
    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns `true` for a final decision, `Passed` or `Failed`.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl TryFrom<i16> for RoundOutcome {
    type Error = InvalidValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotInterviewed),
            1 => Ok(Self::Passed),
            2 => Ok(Self::Failed),
            3 => Ok(Self::Undecided),
            value => Err(InvalidValue { kind: "round outcome", value }),
        }
    }
}

impl From<RoundOutcome> for i16 {
    fn from(outcome: RoundOutcome) -> Self {
        outcome.as_i16()
    }
}

/// Lifecycle of an assignment row.
///
/// Rows are never physically removed; only `Active` rows count towards the
/// one-booking-per-candidate rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum AssignmentStatus {
    /// Current booking.
    #[default]
    Active,
    /// Cancelled by the candidate; the seat was released.
    Cancelled,
    /// The round outcome was recorded; the seat stays counted.
    Completed,
}

impl AssignmentStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Active => 0,
            Self::Cancelled => 1,
            Self::Completed => 2,
        }
    }

    /// Returns `true` for [`AssignmentStatus::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl TryFrom<i16> for AssignmentStatus {
    type Error = InvalidValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Active),
            1 => Ok(Self::Cancelled),
            2 => Ok(Self::Completed),
            value => Err(InvalidValue { kind: "assignment status", value }),
        }
    }
}

impl From<AssignmentStatus> for i16 {
    fn from(status: AssignmentStatus) -> Self {
        status.as_i16()
    }
}
