use crate::config::{ConfigLoadError, ValidationError};
use crate::forwarder::ForwardError;
use crate::splitter::SplitError;
use hyper::StatusCode;
use thiserror::Error;

/// Result type alias for alert-router operations
pub type Result<T, E = AlertRouterError> = std::result::Result<T, E>;

/// Errors that can occur while handling a request
#[derive(Error, Debug)]
pub enum AlertRouterError {
    #[error("Missing `config` query parameter")]
    MissingConfigParam,

    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Failed to parse alert payload: {0}")]
    BodyParseError(#[source] serde_json::Error),

    #[error("Failed to split alerts: {0}")]
    Split(#[from] SplitError),

    #[error("Failed to serialize alert group: {0}")]
    GroupSerializationError(#[source] serde_json::Error),

    #[error("Failed to forward alert group: {0}")]
    Forward(#[from] ForwardError),

    #[error("Failed to reload config: {0}")]
    Reload(#[from] ConfigLoadError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("Relay task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlertRouterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AlertRouterError::MissingConfigParam
            | AlertRouterError::ConfigNotFound(_)
            | AlertRouterError::RequestBodyError(_) => StatusCode::BAD_REQUEST,
            AlertRouterError::Forward(_) => StatusCode::BAD_GATEWAY,
            AlertRouterError::BodyParseError(_)
            | AlertRouterError::Split(_)
            | AlertRouterError::GroupSerializationError(_)
            | AlertRouterError::Reload(_)
            | AlertRouterError::InvalidConfig(_)
            | AlertRouterError::TaskFailed(_)
            | AlertRouterError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned to the client. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AlertRouterError::MissingConfigParam => "Missing config param",
            AlertRouterError::ConfigNotFound(_) => "Config not found",
            AlertRouterError::RequestBodyError(_) => "Read error",
            AlertRouterError::BodyParseError(_)
            | AlertRouterError::Split(_)
            | AlertRouterError::GroupSerializationError(_) => "Split error",
            AlertRouterError::Forward(_) => "Forward failed",
            AlertRouterError::Reload(_) => "Failed to reload config",
            AlertRouterError::InvalidConfig(_)
            | AlertRouterError::TaskFailed(_)
            | AlertRouterError::Io(_) => "Internal server error",
        }
    }
}
