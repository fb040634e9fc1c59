//! Error types for booking, rebooking and administration operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Error taxonomy for the booking subsystem.
///
/// Business rejections are expected outcomes and carry no payload worth
/// logging. Infrastructure failures carry the underlying error text for the
/// logs; callers only ever see [`BookingError::user_message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Business Rejections
    // ═══════════════════════════════════════════════════════════

    /// The slot does not exist.
    #[error("Slot not found")]
    SlotNotFound,

    /// The slot has already started.
    #[error("Booking window closed")]
    BookingWindowClosed,

    /// Every seat in the slot is taken.
    #[error("Slot capacity exceeded")]
    CapacityExceeded,

    /// The candidate already holds an active assignment.
    #[error("Candidate already booked")]
    AlreadyBooked,

    /// The prerequisite round has not been passed.
    #[error("Candidate not eligible for this round")]
    RoundNotEligible,

    /// The round already has a `Passed` or `Failed` outcome.
    #[error("Round already decided")]
    RoundAlreadyDecided,

    /// A rebook target belongs to a different round than the current booking.
    #[error("Target slot belongs to a different round")]
    RoundMismatch,

    /// The candidate holds no active assignment.
    #[error("Assignment not found")]
    AssignmentNotFound,

    /// The candidate record does not exist.
    #[error("Candidate not found")]
    CandidateNotFound,

    /// Slot creation parameters are invalid.
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    // ═══════════════════════════════════════════════════════════
    // Transient Failures
    // ═══════════════════════════════════════════════════════════

    /// Another request holds the slot lock.
    #[error("Slot is busy")]
    LockBusy,

    /// The request deadline expired before any mutation started.
    #[error("Request timed out")]
    Timeout,

    /// Database operation failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Lock store operation failed.
    #[error("Lock service unavailable: {0}")]
    LockServiceUnavailable(String),

    /// Email delivery failed.
    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    // ═══════════════════════════════════════════════════════════
    // Invariant Violations
    // ═══════════════════════════════════════════════════════════

    /// Stored counters or rows contradict each other.
    #[error("Storage inconsistency: {0}")]
    StorageInconsistency(String),
}

impl BookingError {
    /// Returns `true` if retrying the same request may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use interview_booking::BookingError;
    /// assert!(BookingError::LockBusy.is_transient());
    /// assert!(!BookingError::CapacityExceeded.is_transient());
    /// ```
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::LockBusy
                | Self::Timeout
                | Self::StorageUnavailable(_)
                | Self::LockServiceUnavailable(_)
                | Self::NotificationFailed(_)
        )
    }

    /// Returns `true` for expected rejections caused by the request itself
    /// or the current state of the slot.
    ///
    /// # Examples
    ///
    /// ```
    /// # use interview_booking::BookingError;
    /// assert!(BookingError::AlreadyBooked.is_business_rejection());
    /// assert!(!BookingError::StorageInconsistency("x".into()).is_business_rejection());
    /// ```
    #[must_use]
    pub const fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            Self::SlotNotFound
                | Self::BookingWindowClosed
                | Self::CapacityExceeded
                | Self::AlreadyBooked
                | Self::RoundNotEligible
                | Self::RoundAlreadyDecided
                | Self::RoundMismatch
                | Self::AssignmentNotFound
                | Self::CandidateNotFound
                | Self::InvalidSlot(_)
        )
    }

    /// Coarse classification for transports.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::LockBusy => ErrorKind::LockBusy,
            Self::SlotNotFound => ErrorKind::SlotNotFound,
            Self::BookingWindowClosed => ErrorKind::BookingWindowClosed,
            Self::CapacityExceeded => ErrorKind::CapacityExceeded,
            Self::AlreadyBooked => ErrorKind::AlreadyBooked,
            Self::RoundNotEligible => ErrorKind::RoundNotEligible,
            Self::RoundAlreadyDecided => ErrorKind::RoundAlreadyDecided,
            Self::RoundMismatch => ErrorKind::RoundMismatch,
            Self::AssignmentNotFound => ErrorKind::AssignmentNotFound,
            Self::CandidateNotFound => ErrorKind::CandidateNotFound,
            Self::InvalidSlot(_) => ErrorKind::InvalidSlot,
            Self::Timeout => ErrorKind::Timeout,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::LockServiceUnavailable(_) => ErrorKind::LockServiceUnavailable,
            Self::NotificationFailed(_) => ErrorKind::NotificationFailed,
            Self::StorageInconsistency(_) => ErrorKind::StorageInconsistency,
        }
    }

    /// Short reason shown to the end user.
    ///
    /// Infrastructure details never appear here.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::LockBusy => "当前时段繁忙，请稍后重试",
            Self::SlotNotFound => "面试时段不存在",
            Self::BookingWindowClosed => "报名时间已经截止",
            Self::CapacityExceeded => "该时段已报满",
            Self::AlreadyBooked => "你已预约过面试，请勿重复提交",
            Self::RoundNotEligible => "一面未通过，无法参加二面",
            Self::RoundAlreadyDecided => "该轮面试结果已出，无法再次预约",
            Self::RoundMismatch => "目标时段与当前预约不属于同一轮面试",
            Self::AssignmentNotFound => "未报名，无法进行该操作",
            Self::CandidateNotFound => "用户不存在",
            Self::InvalidSlot(_) => "面试时段设置不合法",
            Self::Timeout => "请求超时，请稍后重试",
            Self::StorageUnavailable(_) | Self::LockServiceUnavailable(_) => {
                "服务暂时不可用，请稍后重试"
            }
            Self::NotificationFailed(_) => "通知发送失败，请稍后重试",
            Self::StorageInconsistency(_) => "系统内部错误，请联系管理员",
        }
    }
}

/// Discriminant of [`BookingError`] without its diagnostic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ErrorKind {
    LockBusy,
    SlotNotFound,
    BookingWindowClosed,
    CapacityExceeded,
    AlreadyBooked,
    RoundNotEligible,
    RoundAlreadyDecided,
    RoundMismatch,
    AssignmentNotFound,
    CandidateNotFound,
    InvalidSlot,
    Timeout,
    StorageUnavailable,
    LockServiceUnavailable,
    NotificationFailed,
    StorageInconsistency,
}

/// Outcome of a booking-related request, as handed to a transport.
///
/// Serializes as `{"status":"ok"}` or
/// `{"status":"error","kind":"CapacityExceeded","message":"该时段已报满","retryable":false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BookingReply {
    /// The operation committed.
    Ok,
    /// The operation was rejected or failed.
    Error {
        /// Error classification.
        kind: ErrorKind,
        /// User-facing reason.
        message: String,
        /// Whether retrying may succeed.
        retryable: bool,
    },
}

impl<T> From<&Result<T>> for BookingReply {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(error) => Self::from(error),
        }
    }
}

impl From<&BookingError> for BookingReply {
    fn from(error: &BookingError) -> Self {
        Self::Error {
            kind: error.kind(),
            message: error.user_message().to_string(),
            retryable: error.is_transient(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_business_and_transient_are_disjoint() {
        let all = [
            BookingError::LockBusy,
            BookingError::SlotNotFound,
            BookingError::BookingWindowClosed,
            BookingError::CapacityExceeded,
            BookingError::AlreadyBooked,
            BookingError::RoundNotEligible,
            BookingError::RoundAlreadyDecided,
            BookingError::RoundMismatch,
            BookingError::AssignmentNotFound,
            BookingError::CandidateNotFound,
            BookingError::InvalidSlot("start after end".into()),
            BookingError::Timeout,
            BookingError::StorageUnavailable("down".into()),
            BookingError::LockServiceUnavailable("down".into()),
            BookingError::NotificationFailed("smtp".into()),
            BookingError::StorageInconsistency("negative".into()),
        ];

        for error in &all {
            assert!(!(error.is_transient() && error.is_business_rejection()), "{error:?}");
        }
    }

    #[test]
    fn test_user_messages_do_not_leak_details() {
        let error = BookingError::StorageUnavailable("connection refused on 10.0.0.3".into());
        assert!(!error.user_message().contains("10.0.0.3"));
        assert_ne!(
            BookingError::CapacityExceeded.user_message(),
            BookingError::AlreadyBooked.user_message()
        );
    }

    #[test]
    fn test_reply_wire_shape() {
        let ok: Result<()> = Ok(());
        assert_eq!(
            serde_json::to_value(BookingReply::from(&ok)).unwrap(),
            json!({ "status": "ok" })
        );

        let busy: Result<()> = Err(BookingError::LockBusy);
        assert_eq!(
            serde_json::to_value(BookingReply::from(&busy)).unwrap(),
            json!({
                "status": "error",
                "kind": "LockBusy",
                "message": "当前时段繁忙，请稍后重试",
                "retryable": true,
            })
        );
    }
}
