//! Booking engines.
//!
//! - [`BookingEngine`]: book, cancel, rebook and the candidate-side queries
//! - [`EligibilityGate`]: round sequencing
//! - [`AdminService`]: slot creation, outcomes and result publication
//!
//! Every slot mutation follows the same shape:
//!
//! ```text
//! lock slot(s) → validate (deadline-bounded reads) → one transaction → release
//! ```

pub mod admin;
pub mod booking;
pub mod eligibility;
pub mod guard;
pub mod rebooking;

pub use admin::{AdminService, Dispatch};
pub use booking::BookingEngine;
pub use eligibility::EligibilityGate;

use crate::error::{BookingError, Result};
use interview_booking_core::{CandidateId, SlotId};

/// Log a finished operation at a level matching its outcome.
///
/// Rejections are expected and stay at debug. Infrastructure failures and
/// counter inconsistencies are errors.
fn trace_outcome<T>(
    operation: &'static str,
    candidate: CandidateId,
    slot: Option<SlotId>,
    result: &Result<T>,
) {
    let slot_id = slot.map(|s| s.0);
    match result {
        Ok(_) => tracing::info!(
            operation = operation,
            candidate_id = %candidate,
            slot_id = ?slot_id,
            "Booking operation committed"
        ),
        Err(e) if e.is_business_rejection() || *e == BookingError::LockBusy => tracing::debug!(
            operation = operation,
            candidate_id = %candidate,
            slot_id = ?slot_id,
            reason = %e,
            "Booking operation rejected"
        ),
        Err(BookingError::Timeout) => tracing::warn!(
            operation = operation,
            candidate_id = %candidate,
            slot_id = ?slot_id,
            "Booking operation timed out before mutation"
        ),
        Err(e @ BookingError::StorageInconsistency(_)) => tracing::error!(
            operation = operation,
            candidate_id = %candidate,
            slot_id = ?slot_id,
            error = %e,
            "Capacity bookkeeping inconsistency"
        ),
        Err(e) => tracing::error!(
            operation = operation,
            candidate_id = %candidate,
            slot_id = ?slot_id,
            error = %e,
            "Booking operation failed"
        ),
    }
}
