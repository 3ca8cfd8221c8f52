//! Enhanced (AI-augmented) report availability errors
//!
//! The acquisition protocol never escalates these to the caller as export
//! failures; they select the baseline fallback and explain why.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Coarse category of why an enhanced report could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnavailableReason {
    /// Generation is still running on the backend.
    InProgress,
    /// AI analysis is switched off on the backend.
    NotConfigured,
    /// Nothing met the severity threshold for AI review.
    NoQualifyingIssues,
    /// Any other failure (transport, server error, undecodable body).
    Failed,
}

impl UnavailableReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::NotConfigured => "not_configured",
            Self::NoQualifyingIssues => "no_qualifying_issues",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum EnhancedError {
    #[error("enhanced report is still being generated")]
    InProgress,

    #[error("AI analysis is not configured: {message}")]
    NotConfigured { message: String },

    #[error("no issues qualified for AI review: {message}")]
    NoQualifyingIssues { message: String },

    #[error("enhanced report unavailable: {message}")]
    Unavailable { message: String },
}

impl EnhancedError {
    #[must_use]
    pub fn reason(&self) -> UnavailableReason {
        match self {
            Self::InProgress => UnavailableReason::InProgress,
            Self::NotConfigured { .. } => UnavailableReason::NotConfigured,
            Self::NoQualifyingIssues { .. } => UnavailableReason::NoQualifyingIssues,
            Self::Unavailable { .. } => UnavailableReason::Failed,
        }
    }
}

impl UserFacingError for EnhancedError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::InProgress => Cow::Borrowed("AI analysis is in progress, try again later"),
            Self::NotConfigured { .. } => {
                Cow::Borrowed("AI analysis is not enabled on this scanner")
            }
            Self::NoQualifyingIssues { .. } => {
                Cow::Borrowed("No issues met the severity threshold for AI review")
            }
            Self::Unavailable { .. } => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InProgress => Some("Re-run the export in a minute to include AI analysis."),
            Self::NotConfigured { .. } => {
                Some("Ask the scanner operator to configure an AI model.")
            }
            Self::NoQualifyingIssues { .. } => None,
            Self::Unavailable { .. } => Some("The standard report was exported instead."),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::InProgress | Self::Unavailable { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InProgress => "enhanced.in_progress",
            Self::NotConfigured { .. } => "enhanced.not_configured",
            Self::NoQualifyingIssues { .. } => "enhanced.no_qualifying_issues",
            Self::Unavailable { .. } => "enhanced.unavailable",
        })
    }
}
