//! Distributed per-slot lock.
//!
//! One booking mutation per slot proceeds at a time across every server
//! process. The lock expires on its own, so a crashed holder cannot wedge a
//! slot forever.

use crate::error::Result;
use crate::state::LockToken;
use std::time::Duration;

/// Short-lived exclusive claim on a resource key.
///
/// # Example
///
/// ```no_run
/// use interview_booking::providers::SlotLock;
/// use std::time::Duration;
///
/// # async fn example(lock: impl SlotLock) -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(token) = lock.acquire("lock:slot:5", Duration::from_secs(10)).await? {
///     // ... critical section ...
///     lock.release("lock:slot:5", &token).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub trait SlotLock: Send + Sync {
    /// Try to take the lock once, without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(token))` - Lock taken; `token` proves ownership
    /// * `Ok(None)` - Someone else holds the lock
    ///
    /// # Errors
    ///
    /// Returns `BookingError::LockServiceUnavailable` if the lock store fails.
    fn acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<Option<LockToken>>> + Send;

    /// Release the lock if `token` still owns it.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Lock released
    /// * `Ok(false)` - The lock expired or belongs to another token; nothing removed
    ///
    /// # Errors
    ///
    /// Returns `BookingError::LockServiceUnavailable` if the lock store fails.
    fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}
