//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! for use in unit and integration tests.

pub mod notifier;
pub mod slot_lock;
pub mod store;

pub use notifier::MockNotifier;
pub use slot_lock::MockSlotLock;
pub use store::{MockBookingStore, MockSlotTransaction, candidate};
