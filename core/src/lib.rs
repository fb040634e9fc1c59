//! # Interview Booking Core
//!
//! Domain vocabulary shared by every interview-booking crate.
//!
//! This crate deliberately contains no I/O. It provides:
//!
//! - **Identifiers**: [`SlotId`], [`CandidateId`], [`AssignmentId`], [`AdminId`]
//! - **Closed value sets**: [`Round`], [`Track`], [`RoundOutcome`], [`AssignmentStatus`]
//! - **Environment traits**: [`environment::Clock`] and its production
//!   implementation [`environment::SystemClock`]
//!
//! ## Example
//!
//! ```
//! use interview_booking_core::{Round, RoundOutcome};
//!
//! let round = Round::try_from(2_i16).unwrap();
//! assert_eq!(round.previous(), Some(Round::First));
//! assert!(RoundOutcome::Passed.is_passed());
//! ```

pub mod environment;
pub mod types;

pub use types::{
    AdminId, AssignmentId, AssignmentStatus, CandidateId, InvalidValue, Round, RoundOutcome,
    SlotId, Track,
};
