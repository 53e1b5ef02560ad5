use std::path::PathBuf;
use thiserror::Error;

const TAGS_DOCS: &str =
    "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-properties-resource-tags.html";
const PARAMETERS_DOCS: &str =
    "https://aws.amazon.com/blogs/devops/passing-parameters-to-cloudformation-stacks-with-the-aws-cli-and-powershell/";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Unable to load tags from {path}. Tags must be valid JSON: an array of \
        {{\"Key\": \"...\", \"Value\": \"...\"}} objects with string values only.\n  see {TAGS_DOCS}"
    )]
    InvalidTags {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Unable to load parameters from {path}. Parameters must be valid JSON: an array of \
        {{\"ParameterKey\": \"...\", \"ParameterValue\": \"...\"}} objects with string values only.\n  see {PARAMETERS_DOCS}"
    )]
    InvalidParameters {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    InvalidSettingsFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar { var: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
