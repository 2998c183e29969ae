use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the worker plumbing itself
///
/// Import failures are not errors here; they travel inside
/// [`ImportResponse::Failure`](crate::ImportResponse::Failure).
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Import worker has shut down")]
    Closed,

    #[error("Import worker dropped request {0} without replying")]
    NoReply(crate::RequestId),
}

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, WorkerError>;
