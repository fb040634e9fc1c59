//! Mock slot lock for testing.

use crate::error::{BookingError, Result};
use crate::providers::SlotLock;
use crate::state::LockToken;
use std::collections::HashMap;
use std::future::{Future, ready};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct LockTable {
    held: HashMap<String, (LockToken, Instant)>,
    unavailable: bool,
}

/// Mock slot lock.
///
/// Same semantics as the Redis lock: set-if-absent with expiry and
/// compare-and-delete release. Expiry follows `tokio::time`, so tests
/// running with paused time can move past a TTL instantly.
#[derive(Debug, Clone, Default)]
pub struct MockSlotLock {
    table: Arc<Mutex<LockTable>>,
}

impl MockSlotLock {
    /// Create a new mock slot lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an unexpired lock exists for `key` (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn is_held(&self, key: &str) -> Result<bool> {
        let table = self.lock_table()?;
        Ok(table
            .held
            .get(key)
            .is_some_and(|(_, expires_at)| *expires_at > Instant::now()))
    }

    /// Simulate the lock service going down (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn set_unavailable(&self, unavailable: bool) -> Result<()> {
        self.lock_table()?.unavailable = unavailable;
        Ok(())
    }

    fn lock_table(&self) -> Result<std::sync::MutexGuard<'_, LockTable>> {
        self.table
            .lock()
            .map_err(|_| BookingError::LockServiceUnavailable("Mutex lock failed".to_string()))
    }

    fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockToken>> {
        let mut table = self.lock_table()?;
        if table.unavailable {
            return Err(BookingError::LockServiceUnavailable("injected outage".to_string()));
        }

        let now = Instant::now();
        if let Some((_, expires_at)) = table.held.get(key) {
            if *expires_at > now {
                return Ok(None);
            }
        }

        let token = LockToken::generate();
        table.held.insert(key.to_string(), (token.clone(), now + ttl));
        Ok(Some(token))
    }

    fn try_release(&self, key: &str, token: &LockToken) -> Result<bool> {
        let mut table = self.lock_table()?;
        if table.unavailable {
            return Err(BookingError::LockServiceUnavailable("injected outage".to_string()));
        }

        let owned = table
            .held
            .get(key)
            .is_some_and(|(held, expires_at)| held == token && *expires_at > Instant::now());
        if owned {
            table.held.remove(key);
        }
        Ok(owned)
    }
}

impl SlotLock for MockSlotLock {
    fn acquire(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<Option<LockToken>>> + Send {
        ready(self.try_acquire(key, ttl))
    }

    fn release(&self, key: &str, token: &LockToken) -> impl Future<Output = Result<bool>> + Send {
        ready(self.try_release(key, token))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_second_acquire_is_busy() {
        let lock = MockSlotLock::new();

        let first = lock.acquire("lock:slot:5", Duration::from_secs(10)).await.unwrap();
        let second = lock.acquire("lock:slot:5", Duration::from_secs(10)).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let lock = MockSlotLock::new();

        assert!(lock.acquire("lock:slot:1", Duration::from_secs(10)).await.unwrap().is_some());
        assert!(lock.acquire("lock:slot:2", Duration::from_secs(10)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_foreign_token_release_is_refused() {
        let lock = MockSlotLock::new();
        let token = lock.acquire("k", Duration::from_secs(10)).await.unwrap().unwrap();

        assert!(!lock.release("k", &LockToken::generate()).await.unwrap());
        assert!(lock.is_held("k").unwrap());
        assert!(lock.release("k", &token).await.unwrap());
        assert!(!lock.is_held("k").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_holder_cannot_release_new_lock() {
        let lock = MockSlotLock::new();
        let stale = lock.acquire("k", Duration::from_secs(10)).await.unwrap().unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        let fresh = lock.acquire("k", Duration::from_secs(10)).await.unwrap().unwrap();

        assert!(!lock.release("k", &stale).await.unwrap());
        assert!(lock.is_held("k").unwrap());
        assert!(lock.release("k", &fresh).await.unwrap());
    }
}
