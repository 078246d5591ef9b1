//! Console error types.
//!
//! Every failure the panels and stores can report carries a stable
//! [`ErrorCode`], so callers branch on the code instead of on message text.

use serde::Serialize;
use thiserror::Error;

/// Result type for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Machine-readable error classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidNamespace,
    Validation,
    DuplicateCoupon,
    CouponNotFound,
    EditInProgress,
    Store,
}

/// Errors raised by panels and configuration stores.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Namespace identifier is empty or contains the delimiter.
    #[error("invalid namespace '{0}'")]
    InvalidNamespace(String),

    /// A form failed validation. `message` is the text shown next to the control.
    #[error("{panel}: {message}")]
    Validation {
        panel: &'static str,
        field: Option<String>,
        message: String,
    },

    /// Uniqueness constraint on coupon codes.
    #[error("There is already a coupon with that code!")]
    DuplicateCoupon { code: String },

    #[error("coupon not found: {0}")]
    CouponNotFound(String),

    /// A panel already has an open edit session.
    #[error("{0} is already being edited")]
    EditInProgress(&'static str),

    /// Storage backend failure (I/O, corrupt document).
    #[error("store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    /// Stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConsoleError::InvalidNamespace(_) => ErrorCode::InvalidNamespace,
            ConsoleError::Validation { .. } => ErrorCode::Validation,
            ConsoleError::DuplicateCoupon { .. } => ErrorCode::DuplicateCoupon,
            ConsoleError::CouponNotFound(_) => ErrorCode::CouponNotFound,
            ConsoleError::EditInProgress(_) => ErrorCode::EditInProgress,
            ConsoleError::Store(_) | ConsoleError::Io(_) | ConsoleError::Json(_) => {
                ErrorCode::Store
            }
        }
    }

    pub(crate) fn validation(
        panel: &'static str,
        field: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        ConsoleError::Validation {
            panel,
            field,
            message: message.into(),
        }
    }

    /// True when the error is a uniqueness violation on a coupon code.
    pub fn is_duplicate(&self) -> bool {
        self.code() == ErrorCode::DuplicateCoupon
    }
}
