//! Error types shared by the library and the `deploy-cli` binary.

use thiserror::Error;

use crate::config::ConfigError;

/// Client-side error.
///
/// The session core never produces one of these once streaming has started;
/// they cover request construction, configuration, and process setup.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
