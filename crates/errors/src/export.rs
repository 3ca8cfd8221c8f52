//! Export and encoding error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("failed to encode {format} export: {message}")]
    Encode { format: String, message: String },

    #[error("failed to write export to {path}: {message}")]
    Write { path: String, message: String },
}

impl UserFacingError for ExportError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::Encode { .. } => Cow::Borrowed("Export failed"),
            Self::Write { .. } => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Encode { .. } => Some("Try another export format."),
            Self::Write { .. } => Some("Ensure the output directory exists and is writable."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Encode { .. } => "export.encode",
            Self::Write { .. } => "export.write",
        })
    }
}
