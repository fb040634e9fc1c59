//! # Interview Booking
//!
//! Slot booking and capacity management for a recruiting pipeline.
//!
//! Candidates book a seat in a time-boxed interview slot for round 1 or
//! round 2, cancel it, or move it to another slot of the same round.
//! Administrators create slots, record round outcomes and publish results.
//!
//! ## Guarantees
//!
//! - **Capacity**: a slot never holds more than `capacity` seats
//! - **One booking**: a candidate holds at most one active assignment
//! - **Atomic moves**: a rebook frees the old seat and takes the new one
//!   together or not at all
//! - **Round gate**: round 2 is only bookable after passing round 1
//!
//! ## Architecture
//!
//! ```text
//! request → SlotLock (Redis, per slot) → validate → SlotTransaction (PostgreSQL) → reply
//! ```
//!
//! The lock serializes requests per slot. The guarded counter update inside
//! the transaction is the final arbiter of capacity.
//!
//! ## Example
//!
//! ```rust,ignore
//! use interview_booking::*;
//!
//! let env = BookingEnvironment::new(lock, slots, candidates, notifier, SystemClock, config.booking);
//! let engine = BookingEngine::new(env);
//!
//! let reply = BookingReply::from(&engine.book(candidate, request).await);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod providers;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::{BookingConfig, Config};
pub use engine::{AdminService, BookingEngine, Dispatch, EligibilityGate};
pub use environment::BookingEnvironment;
pub use error::{BookingError, BookingReply, ErrorKind, Result};
pub use state::{
    Assignment, BookRequest, Candidate, Eligibility, InterviewResult, NewSlot, Publication,
    RebookRequest, Slot, SlotRoster,
};
