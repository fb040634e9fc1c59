//! Mock notifier for testing.

use crate::error::{BookingError, Result};
use crate::providers::{Notice, Notifier};
use std::collections::HashSet;
use std::future::{Future, ready};
use std::sync::{Arc, Mutex};

/// Mock notifier.
///
/// Records delivered notices. Addresses registered with
/// [`MockNotifier::fail_for`] are rejected.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<Notice>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockNotifier {
    /// Create a new mock notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices delivered so far (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn sent(&self) -> Result<Vec<Notice>> {
        Ok(self
            .sent
            .lock()
            .map_err(|_| BookingError::NotificationFailed("Mutex lock failed".to_string()))?
            .clone())
    }

    /// Reject every notice to `address` (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn fail_for(&self, address: &str) -> Result<()> {
        self.failing
            .lock()
            .map_err(|_| BookingError::NotificationFailed("Mutex lock failed".to_string()))?
            .insert(address.to_string());
        Ok(())
    }

    fn deliver(&self, notice: Notice) -> Result<()> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| BookingError::NotificationFailed("Mutex lock failed".to_string()))?
            .contains(&notice.to);
        if failing {
            return Err(BookingError::NotificationFailed(format!(
                "mailbox {} rejected",
                notice.to
            )));
        }

        self.sent
            .lock()
            .map_err(|_| BookingError::NotificationFailed("Mutex lock failed".to_string()))?
            .push(notice);
        Ok(())
    }
}

impl Notifier for MockNotifier {
    fn send(&self, notice: Notice) -> impl Future<Output = Result<()>> + Send {
        ready(self.deliver(notice))
    }
}
