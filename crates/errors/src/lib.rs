#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the codeagent scanner client
//!
//! One enum per domain (network, stream, config, enhanced report, export,
//! ops) folded into [`Error`] at crate boundaries. Every type is `Clone` so
//! failures can travel inside events.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod enhanced;
pub mod export;
pub mod network;
pub mod ops;
pub mod stream;

// Re-export all error types at the root
pub use config::ConfigError;
pub use enhanced::{EnhancedError, UnavailableReason};
pub use export::ExportError;
pub use network::NetworkError;
pub use ops::OpsError;
pub use stream::StreamError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("enhanced report error: {0}")]
    Enhanced(#[from] EnhancedError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("operation error: {0}")]
    Ops(#[from] OpsError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// What the CLI shows for a failure: message, hint, retry advice and a
/// stable code for `--json` consumers.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Network(err) => err.user_message(),
            Error::Enhanced(err) => err.user_message(),
            Error::Stream(err) => err.user_message(),
            Error::Export(err) => err.user_message(),
            Error::Ops(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_hint(),
            Error::Enhanced(err) => err.user_hint(),
            Error::Stream(err) => err.user_hint(),
            Error::Export(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Ops(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(err) => err.is_retryable(),
            Error::Enhanced(err) => err.is_retryable(),
            Error::Stream(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Stream(err) => err.user_code(),
            Error::Enhanced(err) => err.user_code(),
            Error::Export(err) => err.user_code(),
            Error::Ops(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
