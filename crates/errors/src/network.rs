//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The backend answered with its structured error envelope.
    #[error("API error {status}{}: {message}", format_code(.code))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    DecodeFailed { url: String, message: String },

    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },
}

#[allow(clippy::ref_option)]
fn format_code(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl NetworkError {
    /// HTTP status carried by this error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Backend error code from the `{"error": {"code": ..}}` envelope.
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::Api { message, .. } => Cow::Borrowed(message.as_str()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) | Self::NetworkUnavailable => {
                Some("Check that the scanner API is running and reachable at the configured URL.")
            }
            Self::InvalidUrl(_) => Some("Fix the `api.base_url` setting or the --api-url flag."),
            Self::RateLimited { .. } => Some("Wait for the rate limit window to pass and retry."),
            Self::HttpError { status: 404, .. } | Self::Api { status: 404, .. } => {
                Some("Verify the job identifier; the job or report may have expired.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::ConnectionRefused(_)
            | Self::NetworkUnavailable
            | Self::RateLimited { .. }
            | Self::RequestFailed(_) => true,
            Self::HttpError { status, .. } | Self::Api { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::DecodeFailed { .. } => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Timeout { .. } => "net.timeout",
            Self::RequestFailed(_) => "net.request_failed",
            Self::ConnectionRefused(_) => "net.connection_refused",
            Self::InvalidUrl(_) => "net.invalid_url",
            Self::HttpError { .. } => "net.http",
            Self::Api { .. } => "net.api",
            Self::DecodeFailed { .. } => "net.decode_failed",
            Self::NetworkUnavailable => "net.unavailable",
            Self::RateLimited { .. } => "net.rate_limited",
        };
        Some(code)
    }
}
