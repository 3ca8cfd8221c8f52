use serde::{Deserialize, Serialize};

use crate::EventSource;
use codeagent_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, e.g. `net.timeout`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod export;
pub mod general;
pub mod job;

pub use export::*;
pub use general::*;
pub use job::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Job stream and status log events
    Job(JobEvent),

    /// Export and enhanced report acquisition events
    Export(ExportEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Job(_) => EventSource::JOB,
            Self::Export(_) => EventSource::EXPORT,
        }
    }

    /// Job the event concerns, if any
    #[must_use]
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::General(_) => None,
            Self::Job(event) => Some(event.job_id()),
            Self::Export(event) => Some(event.job_id()),
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Job(JobEvent::StreamFailed { .. })
            | Self::Export(ExportEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Export(ExportEvent::EnhancedFallback { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Job(JobEvent::LogAppended { .. })
            | Self::Export(ExportEvent::EnhancedTriggered { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "codeagent::events::general",
            Self::Job(_) => "codeagent::events::job",
            Self::Export(_) => "codeagent::events::export",
        }
    }
}
