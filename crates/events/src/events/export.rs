use codeagent_types::{ExportFormat, ReportSource, TriggerStatus};
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Export orchestration events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    Started {
        job_id: String,
        format: ExportFormat,
        include_enhanced: bool,
    },

    /// The enhanced report trigger answered
    EnhancedTriggered {
        job_id: String,
        status: TriggerStatus,
    },

    /// Enhanced data was unavailable; the baseline report is used instead
    EnhancedFallback {
        job_id: String,
        reason: String,
        failure: FailureContext,
    },

    Completed {
        job_id: String,
        filename: String,
        source: ReportSource,
        bytes: usize,
    },

    /// Encoding or writing the artifact failed
    Failed {
        job_id: String,
        failure: FailureContext,
    },
}

impl ExportEvent {
    #[must_use]
    pub fn job_id(&self) -> &str {
        match self {
            Self::Started { job_id, .. }
            | Self::EnhancedTriggered { job_id, .. }
            | Self::EnhancedFallback { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. } => job_id,
        }
    }
}
