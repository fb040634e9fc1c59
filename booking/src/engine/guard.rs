//! Critical-section plumbing shared by the engines.
//!
//! - [`with_slot_locks`]: take per-slot locks in ascending order, run a body,
//!   release on every path including a panic inside the body
//! - [`within`]: bound a pre-mutation step by the request deadline
//! - [`finish`]: commit on success, roll back on failure

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::providers::{SlotLock, SlotTransaction};
use crate::state::LockToken;
use futures::FutureExt;
use interview_booking_core::SlotId;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::time::Instant;

/// Run `step`, failing with [`BookingError::Timeout`] once `deadline` passes.
///
/// # Errors
///
/// Returns `BookingError::Timeout` on expiry, otherwise whatever `step` returns.
pub async fn within<T>(deadline: Instant, step: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout_at(deadline, step)
        .await
        .map_err(|_| BookingError::Timeout)?
}

/// Take the locks of `slots`, run `body`, release the locks.
///
/// Locks are taken in ascending slot order so two requests touching the same
/// pair of slots cannot deadlock. Acquisition never waits on a held lock: a
/// busy slot fails with [`BookingError::LockBusy`] immediately. A lock
/// granted after `deadline` is released again and the call fails with
/// [`BookingError::Timeout`]; `body` bounds its own reads.
///
/// A panic inside `body` is caught, the locks are released, and the panic is
/// resumed.
///
/// # Errors
///
/// Returns `BookingError::LockBusy`, `BookingError::Timeout` or
/// `BookingError::LockServiceUnavailable` if the locks cannot be taken,
/// otherwise whatever `body` returns.
pub async fn with_slot_locks<L, T>(
    lock: &L,
    config: &BookingConfig,
    slots: &[SlotId],
    deadline: Instant,
    body: impl Future<Output = Result<T>> + Send,
) -> Result<T>
where
    L: SlotLock,
{
    let mut ordered = slots.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut held: Vec<(String, LockToken)> = Vec::with_capacity(ordered.len());
    for slot in ordered {
        let key = config.lock_key(slot);
        // Never cancelled at the deadline: a grant that already took effect
        // must come back with its token so it can be released
        match lock.acquire(&key, config.lock_ttl).await {
            Ok(Some(token)) => {
                held.push((key, token));
                if Instant::now() >= deadline {
                    release_all(lock, held).await;
                    return Err(BookingError::Timeout);
                }
            }
            Ok(None) => {
                release_all(lock, held).await;
                return Err(BookingError::LockBusy);
            }
            Err(e) => {
                release_all(lock, held).await;
                return Err(e);
            }
        }
    }

    let outcome = AssertUnwindSafe(body).catch_unwind().await;
    release_all(lock, held).await;

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Release in reverse acquisition order. Failures are logged; the TTL
/// reclaims any lock left behind.
async fn release_all<L: SlotLock>(lock: &L, held: Vec<(String, LockToken)>) {
    for (key, token) in held.into_iter().rev() {
        match lock.release(&key, &token).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(key = %key, "Slot lock expired before release"),
            Err(e) => tracing::error!(key = %key, error = %e, "Failed to release slot lock"),
        }
    }
}

/// Commit `tx` if `outcome` is `Ok`, roll it back otherwise.
///
/// # Errors
///
/// Returns the original error on failure, or the commit error if the commit
/// itself fails.
pub async fn finish<Tx, T>(tx: Tx, outcome: Result<T>) -> Result<T>
where
    Tx: SlotTransaction,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, cause = %e, "Rollback failed");
            }
            Err(e)
        }
    }
}
