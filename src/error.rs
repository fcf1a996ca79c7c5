//! Error types for Lab Assist.

use crate::queue::RequesterStatus;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Precondition violations raised by the match engine.
///
/// These are caller defects, not recoverable conditions: the engine refuses
/// the operation and leaves all state untouched.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Requester {user} is {status}, expected idle")]
    RequesterNotIdle { user: String, status: RequesterStatus },

    #[error("Requester {user} is {status}, expected queued")]
    RequesterNotQueued { user: String, status: RequesterStatus },

    #[error("{user} is not a registered helper")]
    UnknownHelper { user: String },

    #[error("Helper {helper} is not helping anyone")]
    HelperNotBusy { helper: String },
}

/// Slack Web API errors.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("Slack {method} request failed: {reason}")]
    RequestFailed { method: String, reason: String },

    #[error("Slack {method} returned an error: {error}")]
    Api { method: String, error: String },

    #[error("Malformed Slack response for {method}: missing {field}")]
    MissingField {
        method: String,
        field: &'static str,
    },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
