//! AWS backend error types

use stackwatch_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("aws CLI not found. Please install: https://aws.amazon.com/cli/")]
    CliNotFound,

    #[error("aws authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("aws command failed: {0}")]
    CommandFailed(String),

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Change set name missing for stack {0}")]
    MissingChangeSet(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<AwsError> for CoreError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::CliNotFound | AwsError::AuthenticationFailed(_) => {
                CoreError::AuthenticationFailed(err.to_string())
            }
            AwsError::StackNotFound(name) => CoreError::StackNotFound(name),
            AwsError::JsonError(e) => CoreError::Json(e),
            AwsError::IoError(e) => CoreError::Io(e),
            AwsError::Core(e) => e,
            AwsError::CommandFailed(_) | AwsError::MissingChangeSet(_) => {
                CoreError::Api(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
