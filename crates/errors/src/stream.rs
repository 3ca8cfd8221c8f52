//! Job event-stream error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Failures of the event stream transport itself, never of the job.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("invalid event stream URL: {url}")]
    InvalidUrl { url: String },

    #[error("failed to open event stream: {message}")]
    Connect { message: String },

    #[error("event stream rejected with HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("event stream interrupted: {message}")]
    Transport { message: String },

    #[error("event stream ended unexpectedly")]
    Ended,

    #[error("malformed event payload: {message}")]
    Decode { message: String },
}

impl UserFacingError for StreamError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidUrl { .. } => Some("Fix the `api.base_url` setting."),
            Self::Connect { .. } | Self::Transport { .. } | Self::Ended => {
                Some("Refresh the job status or watch the job again.")
            }
            Self::HttpStatus { .. } | Self::Decode { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Transport { .. } | Self::Ended
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidUrl { .. } => "stream.invalid_url",
            Self::Connect { .. } => "stream.connect",
            Self::HttpStatus { .. } => "stream.http_status",
            Self::Transport { .. } => "stream.transport",
            Self::Ended => "stream.ended",
            Self::Decode { .. } => "stream.decode",
        };
        Some(code)
    }
}
