//! Error types for agenda
//!
//! Every error belongs to one of six kinds (validation, storage,
//! authentication, notification, task, unknown) and carries a machine code,
//! a human message and optional JSON details.
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (invalid input, bad credentials, unknown task)
//! - 4: Operation failed (storage, notification facility, unexpected)

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Exit codes for the agenda CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Coarse error category, used for exit codes and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Storage,
    Authentication,
    Notification,
    Task,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Storage => "storage",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Notification => "notification",
            ErrorKind::Task => "task",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for agenda operations
#[derive(Error, Debug)]
pub enum Error {
    // Validation
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Authentication
    #[error("{message}")]
    Authentication { code: &'static str, message: String },

    // Task
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task already exists: {0}")]
    TaskExists(String),

    // Storage
    #[error("Corrupt data under {key}: {message}")]
    CorruptData {
        key: String,
        code: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    // Notification
    #[error("Notification error: {0}")]
    Notification(String),

    // Anything unexpected, with the original error kept as context
    #[error("Unexpected error: {message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn authentication(code: &'static str, message: impl Into<String>) -> Self {
        Error::Authentication {
            code,
            message: message.into(),
        }
    }

    /// Wrap an unexpected failure, keeping it as the error source.
    pub fn unknown<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Unknown {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } | Error::InvalidArgument(_) | Error::InvalidConfig(_) => {
                ErrorKind::Validation
            }
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::TaskNotFound(_) | Error::TaskExists(_) => ErrorKind::Task,
            Error::CorruptData { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => ErrorKind::Storage,
            Error::Notification(_) => ErrorKind::Notification,
            Error::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { code, .. } => code,
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Authentication { code, .. } => code,
            Error::TaskNotFound(_) => "TASK_NOT_FOUND",
            Error::TaskExists(_) => "TASK_EXISTS",
            Error::CorruptData { code, .. } => code,
            Error::Io(_) => "STORAGE_IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::TomlParse(_) => "CONFIG_PARSE_ERROR",
            Error::TomlSerialize(_) => "CONFIG_SERIALIZE_ERROR",
            Error::LockFailed(_) => "STORAGE_LOCK_FAILED",
            Error::Notification(_) => "NOTIFICATION_ERROR",
            Error::Unknown { .. } => "UNKNOWN_ERROR",
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Authentication | ErrorKind::Task => {
                exit_codes::USER_ERROR
            }
            ErrorKind::Storage | ErrorKind::Notification | ErrorKind::Unknown => {
                exit_codes::OPERATION_FAILED
            }
        }
    }

    /// Structured context for JSON output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) | Error::TaskExists(id) => {
                Some(serde_json::json!({ "task_id": id }))
            }
            Error::CorruptData { key, .. } => Some(serde_json::json!({ "storage_key": key })),
            Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::Unknown {
                source: Some(source),
                ..
            } => Some(serde_json::json!({ "original_error": source.to_string() })),
            _ => None,
        }
    }
}

/// Result type alias for agenda operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(Serialize)]
pub struct JsonError {
    pub error: String,
    pub kind: ErrorKind,
    pub code: &'static str,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            kind: err.kind(),
            code: err.code(),
            exit_code: err.exit_code(),
            details: err.details(),
        }
    }
}
