//! Redis-based slot lock.
//!
//! # Algorithm
//!
//! - Acquire: `SET key token NX PX ttl`, one atomic command.
//! - Release: Lua compare-and-delete, so a holder whose lock already expired
//!   cannot remove a lock that now belongs to someone else.

use crate::error::{BookingError, Result};
use crate::providers::SlotLock;
use crate::state::LockToken;
use redis::aio::ConnectionManager;
use redis::Client;
use std::time::Duration;

/// Deletes `KEYS[1]` only if it still holds `ARGV[1]`.
const RELEASE_SCRIPT: &str = r"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    else
        return 0
    end
";

/// `Redis` slot lock.
///
/// # Example
///
/// ```no_run
/// use interview_booking::stores::RedisSlotLock;
/// use interview_booking::providers::SlotLock;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let lock = RedisSlotLock::new("redis://127.0.0.1:6379").await?;
/// let token = lock.acquire("lock:slot:5", Duration::from_secs(10)).await?;
/// assert!(token.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisSlotLock {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    /// Compiled release script.
    release_script: redis::Script,
}

impl RedisSlotLock {
    /// Create a new `Redis` slot lock.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - `Redis` connection URL (e.g., "<redis://127.0.0.1:6379>")
    ///
    /// # Errors
    ///
    /// Returns error if connection to `Redis` fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            BookingError::LockServiceUnavailable(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            BookingError::LockServiceUnavailable(format!(
                "Failed to create Redis connection manager: {e}"
            ))
        })?;

        Ok(Self {
            conn_manager,
            release_script: redis::Script::new(RELEASE_SCRIPT),
        })
    }

    /// Round-trip to the server.
    ///
    /// # Errors
    ///
    /// Returns error if `Redis` does not answer.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| BookingError::LockServiceUnavailable(format!("Redis ping failed: {e}")))?;
        Ok(())
    }
}

impl SlotLock for RedisSlotLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockToken>> {
        let mut conn = self.conn_manager.clone();
        let token = LockToken::generate();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        // Reply is "OK" when set, nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(&token.0)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Redis SET NX failed");
                BookingError::LockServiceUnavailable(format!("Failed to acquire lock: {e}"))
            })?;

        if reply.is_some() {
            tracing::debug!(key = %key, ttl_ms = ttl_ms, "Acquired slot lock");
            Ok(Some(token))
        } else {
            tracing::debug!(key = %key, "Slot lock busy");
            Ok(None)
        }
    }

    async fn release(&self, key: &str, token: &LockToken) -> Result<bool> {
        let mut conn = self.conn_manager.clone();

        let deleted: i64 = self
            .release_script
            .key(key)
            .arg(&token.0)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %key, "Redis lock release script failed");
                BookingError::LockServiceUnavailable(format!("Failed to release lock: {e}"))
            })?;

        if deleted == 0 {
            tracing::debug!(key = %key, "Slot lock was not held by this token on release");
        }

        Ok(deleted == 1)
    }
}
