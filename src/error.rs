//! Error types for checklists
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown checklist or item, bad import payload)
//! - 3: Rejected by tree rules (moving an item into its own subtree)
//! - 4: Operation failed (I/O, lock contention, encoding)

use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::codec::DecodeError;

/// Exit codes for the `cl` binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for checklist operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Checklist not found: {0}")]
    ChecklistNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Import failed: {0}")]
    Import(#[from] DecodeError),

    // Tree rule violations (exit code 3)
    #[error("Cannot move item {item} under {target}: target is inside the moved subtree")]
    InvalidMove { item: Uuid, target: Uuid },

    #[error("Cannot place item {item}: nesting level would exceed {max}")]
    NestingTooDeep { item: Uuid, max: u32 },

    // Operation failures (exit code 4)
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

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::ChecklistNotFound(_)
            | Error::ItemNotFound(_)
            | Error::Import(_) => exit_codes::USER_ERROR,

            // Tree rules
            Error::InvalidMove { .. } | Error::NestingTooDeep { .. } => exit_codes::REJECTED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable label for the exit-code group
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::REJECTED => "rejected",
            _ => "operation_failed",
        }
    }

    /// Structured payload for machine-readable error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::ItemNotFound(query) => Some(json!({ "item": query })),
            Error::ChecklistNotFound(query) => Some(json!({ "checklist": query })),
            Error::InvalidMove { item, target } => Some(json!({
                "item": item.to_string(),
                "target": target.to_string(),
            })),
            Error::Import(err) => Some(json!({
                "kind": err.kind.label(),
                "field": err.field,
                "path": err.path_display(),
            })),
            Error::NestingTooDeep { item, max } => Some(json!({
                "item": item.to_string(),
                "max_nesting_level": max,
            })),
            Error::LockFailed(path) => Some(json!({ "path": path.to_string_lossy() })),
            Error::InvalidConfig(message)
            | Error::InvalidArgument(message)
            | Error::OperationFailed(message) => Some(json!({ "message": message })),
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => None,
        }
    }
}

/// Result type alias for checklist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Body of the `error` field in the JSON error envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
