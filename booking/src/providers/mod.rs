//! Booking providers.
//!
//! This module defines traits for all external dependencies used by the
//! booking engines. These traits enable dependency injection and make the
//! booking logic testable.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The engines depend on
//! these traits; `stores` supplies Redis and `PostgreSQL` implementations and
//! `mocks` supplies in-memory ones.
//!
//! ```text
//! ┌──────────────────┐   acquire/release   ┌──────────────────┐
//! │ BookingEngine    │────────────────────▶│ SlotLock (Redis) │
//! │ AdminService     │                     └──────────────────┘
//! │                  │   begin/commit      ┌──────────────────┐
//! │                  │────────────────────▶│ SlotRepository   │
//! │                  │                     │ (PostgreSQL)     │
//! │                  │   outcomes          ┌──────────────────┐
//! │                  │────────────────────▶│ CandidateRepo    │
//! │                  │   result notices    ┌──────────────────┐
//! │                  │────────────────────▶│ Notifier (SMTP)  │
//! └──────────────────┘                     └──────────────────┘
//! ```

pub mod candidate_repository;
pub mod console_notifier;
pub mod notifier;
pub mod slot_lock;
pub mod slot_repository;
pub mod smtp_notifier;

// Re-export provider traits
pub use candidate_repository::CandidateRepository;
pub use console_notifier::ConsoleNotifier;
pub use notifier::{Notice, Notifier};
pub use slot_lock::SlotLock;
pub use slot_repository::{SlotRepository, SlotTransaction};
pub use smtp_notifier::{MailNotifier, SmtpNotifier};
