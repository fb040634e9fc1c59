//! Storage implementations.
//!
//! - [`RedisSlotLock`]: distributed slot locks
//! - [`postgres`]: slots, assignments and candidates

pub mod lock_redis;
pub mod postgres;

pub use lock_redis::RedisSlotLock;
pub use postgres::{PostgresCandidateRepository, PostgresSlotRepository, PostgresSlotTransaction};
