//! Core error types

use thiserror::Error;

/// Errors raised by the watcher core
#[derive(Error, Debug)]
pub enum CoreError {
    /// A change/event/resource record arrived without a field the normalizer requires.
    #[error("Malformed {record} record: missing {field}")]
    MalformedRecord {
        record: &'static str,
        field: &'static str,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Change set failed: {0}")]
    ChangeSetFailed(String),

    #[error("No changes to deploy: {0}")]
    NoChanges(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn malformed(record: &'static str, field: &'static str) -> Self {
        Self::MalformedRecord { record, field }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
