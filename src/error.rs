//! Error types for lexportal.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration file {path}: {message}")]
    ParseError { path: String, message: String },
}

/// Errors raised by the remote data gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Non-success status with a JSON body.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Response was not JSON; body kept as text.
    #[error("HTTP {status}: {status_text}")]
    NonJson {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Invalid JSON response (HTTP {status}): {message}")]
    InvalidJson { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the request reached the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. }
            | Self::NonJson { status, .. }
            | Self::InvalidJson { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidUrl(_) | Self::UnexpectedShape(_) => None,
        }
    }
}

/// Local key-value storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage IO error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to encode/decode '{key}': {reason}")]
    Serialization { key: String, reason: String },

    #[error("Persistent storage is not available")]
    Unavailable,
}

/// Record collection errors.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} '{id}' already exists")]
    Duplicate { kind: &'static str, id: String },

    #[error("{kind} '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        kind: &'static str,
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text-completion call errors.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion endpoint returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Completion endpoint returned no text")]
    EmptyResponse,
}

/// Assistant chat errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("A message is already being sent")]
    SendInFlight,

    #[error("Message must not be empty")]
    EmptyPrompt,
}
