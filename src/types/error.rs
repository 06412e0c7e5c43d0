//! Error types for coffer
//!
//! Two classes of failure flow through the bot: rejections the caller is
//! meant to see (missing registration, cooldowns, operator-only commands)
//! and infrastructure failures that are logged and reported generically.

use hyper::StatusCode;
use std::time::Duration;

/// Main error type for coffer operations
#[derive(Debug, thiserror::Error)]
pub enum CofferError {
    #[error("Caller is not registered")]
    NotRegistered,

    #[error("Caller is already registered")]
    AlreadyRegistered,

    #[error("{0} doesn't have a registered account")]
    TargetNotFound(String),

    #[error("{action} on cooldown for {}ms", .remaining.as_millis())]
    Cooldown {
        action: &'static str,
        remaining: Duration,
    },

    #[error("Command {command} on cooldown for {}ms", .remaining.as_millis())]
    CommandCooldown {
        command: String,
        remaining: Duration,
    },

    #[error("Only the bot operator can do that")]
    OperatorOnly,

    #[error("No announcement found with ID starting with \"{0}\"")]
    AnnouncementNotFound(String),

    #[error("Announcement ID prefix \"{prefix}\" matches {} announcements", .matches.len())]
    AmbiguousPrefix { prefix: String, matches: Vec<String> },

    #[error("Announcement ID prefix must be at least {min} characters")]
    PrefixTooShort { min: usize },

    #[error("{0}")]
    AlreadyInState(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CofferError {
    /// Whether the error is a rejection the caller should see verbatim.
    ///
    /// Everything else is logged and shown as a generic transient failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered
                | Self::AlreadyRegistered
                | Self::TargetNotFound(_)
                | Self::Cooldown { .. }
                | Self::CommandCooldown { .. }
                | Self::OperatorOnly
                | Self::AnnouncementNotFound(_)
                | Self::AmbiguousPrefix { .. }
                | Self::PrefixTooShort { .. }
                | Self::AlreadyInState(_)
                | Self::BadRequest(_)
        )
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::OperatorOnly => StatusCode::FORBIDDEN,
            Self::TargetNotFound(_)
            | Self::AnnouncementNotFound(_)
            | Self::NotRegistered => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered | Self::Duplicate(_) | Self::AlreadyInState(_) => {
                StatusCode::CONFLICT
            }
            Self::AmbiguousPrefix { .. } | Self::PrefixTooShort { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Cooldown { .. } | Self::CommandCooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for CofferError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CofferError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for CofferError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for CofferError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<mongodb::error::Error> for CofferError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for CofferError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON encoding failed: {}", err))
    }
}

/// Result type alias for coffer operations
pub type Result<T> = std::result::Result<T, CofferError>;
