//! Booking environment.
//!
//! This module defines the environment type for dependency injection
//! into the booking engine and the administration service.

use crate::config::BookingConfig;
use crate::providers::{CandidateRepository, Notifier, SlotLock, SlotRepository};
use interview_booking_core::environment::Clock;

/// Booking environment.
///
/// Contains all external dependencies needed by the engines. Handles are
/// passed in explicitly; nothing is looked up from global state.
///
/// # Type Parameters
///
/// - `L`: Slot lock
/// - `S`: Slot repository
/// - `C`: Candidate repository
/// - `N`: Notifier
/// - `K`: Clock
#[derive(Clone)]
pub struct BookingEnvironment<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone,
    K: Clock + Clone,
{
    /// Slot lock (`Redis`).
    pub lock: L,

    /// Slots and assignments (`PostgreSQL`).
    pub slots: S,

    /// Candidate records (`PostgreSQL`).
    pub candidates: C,

    /// Result notices (SMTP).
    pub notifier: N,

    /// Time source for booking windows and outcome timestamps.
    pub clock: K,

    /// Engine tuning.
    pub config: BookingConfig,
}

impl<L, S, C, N, K> BookingEnvironment<L, S, C, N, K>
where
    L: SlotLock + Clone,
    S: SlotRepository + Clone,
    C: CandidateRepository + Clone,
    N: Notifier + Clone,
    K: Clock + Clone,
{
    /// Create a new booking environment.
    #[must_use]
    pub const fn new(
        lock: L,
        slots: S,
        candidates: C,
        notifier: N,
        clock: K,
        config: BookingConfig,
    ) -> Self {
        Self {
            lock,
            slots,
            candidates,
            notifier,
            clock,
            config,
        }
    }
}
