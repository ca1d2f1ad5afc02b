//! Error types for guild-modlog

use crate::types::UserId;
use thiserror::Error;

/// Platform error codes for a missing channel access / missing permission
const MISSING_ACCESS_CODE: u32 = 50001;
const MISSING_PERMISSIONS_CODE: u32 = 50013;

/// Raw failure reported by the chat platform API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", describe_code(.code))]
pub struct ApiError {
    /// Platform-specific numeric error code, when the platform supplied one
    pub code: Option<u32>,

    /// Human-readable error message (e.g. "Missing Permissions")
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// The platform refused the call because the bot lacks access or a permission
    pub fn is_missing_permission(&self) -> bool {
        matches!(
            self.code,
            Some(MISSING_ACCESS_CODE) | Some(MISSING_PERMISSIONS_CODE)
        ) || self.message == "Missing Access"
            || self.message == "Missing Permissions"
    }
}

/// Errors that can occur in the moderation log pipeline
#[derive(Debug, Error)]
pub enum ModLogError {
    /// The bot cannot read the guild's audit log
    #[error("Unable to view audit log. I need the 'View Audit Log' permission in '{guild}'")]
    AuditReadDenied { guild: String },

    /// The most recent audit entry belongs to someone else (or there is none)
    #[error("Audit log entry does not match the target {expected} (found {})", describe_found(.found))]
    TargetMismatch {
        expected: UserId,
        found: Option<UserId>,
    },

    /// Chat platform API failure
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Log type name that matches no known category
    #[error("Unknown log type: {0}")]
    UnknownLogType(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_code(code: &Option<u32>) -> String {
    match code {
        Some(code) => format!(" (code {})", code),
        None => String::new(),
    }
}

fn describe_found(found: &Option<UserId>) -> String {
    match found {
        Some(id) => id.to_string(),
        None => "no entry".to_string(),
    }
}

/// Result type alias for moderation log operations
pub type Result<T> = std::result::Result<T, ModLogError>;
