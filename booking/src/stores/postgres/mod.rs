//! PostgreSQL storage implementations.
//!
//! This module provides persistent storage using PostgreSQL for:
//! - Interview slots and their occupied counters
//! - Assignments (soft-deleted through a status column)
//! - Candidate round outcomes and their history

pub mod candidate;
pub mod slot;

// Re-exports
pub use candidate::PostgresCandidateRepository;
pub use slot::{PostgresSlotRepository, PostgresSlotTransaction};

use crate::error::BookingError;

/// Map a driver error to an opaque storage failure, keeping the text for logs.
fn storage_error(action: &str, e: &sqlx::Error) -> BookingError {
    tracing::error!(error = %e, action = %action, "PostgreSQL operation failed");
    BookingError::StorageUnavailable(format!("Failed to {action}: {e}"))
}
