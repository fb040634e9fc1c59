//! Result notice delivery.

use crate::error::Result;

/// Subject of the standard result notice.
pub const DEFAULT_SUBJECT: &str = "【ACAT纳新系统】面试结果通知";

/// An outbound message to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl Notice {
    /// Standard congratulation for passing `round`.
    #[must_use]
    pub fn passed(to: impl Into<String>, name: &str, round: interview_booking_core::Round) -> Self {
        Self {
            to: to.into(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: format!("同学 {name}，你好！恭喜你通过第 {round} 轮面试，请留意后续通知。"),
        }
    }
}

/// Outbound email.
///
/// Delivery is fire-and-forget from the booking core's point of view:
/// callers log failures and move on.
pub trait Notifier: Send + Sync {
    /// Deliver a notice.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::NotificationFailed` if delivery fails.
    fn send(&self, notice: Notice) -> impl std::future::Future<Output = Result<()>> + Send;
}
