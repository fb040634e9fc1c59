//! Console notifier for development and testing.

use crate::error::Result;
use crate::providers::{Notice, Notifier};
use tracing::info;

/// Console notifier.
///
/// Logs notices instead of sending them. Used when no SMTP password is
/// configured.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Create a new console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    async fn send(&self, notice: Notice) -> Result<()> {
        info!(
            to = %notice.to,
            subject = %notice.subject,
            body = %notice.body,
            "Result notice (development mode)"
        );
        Ok(())
    }
}
