use codeagent_types::JobStatus;
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Events from a live job subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Subscription opened against the job's event stream
    StreamOpened { job_id: String, url: String },

    /// The tracked status changed
    StatusChanged { job_id: String, status: JobStatus },

    /// A line was appended to the job's status log
    LogAppended { job_id: String, line: String },

    /// The stream closed, either after a terminal status or on request
    StreamClosed {
        job_id: String,
        final_status: Option<JobStatus>,
    },

    /// The stream could not be opened or broke while the job was running
    StreamFailed {
        job_id: String,
        failure: FailureContext,
    },
}

impl JobEvent {
    #[must_use]
    pub fn job_id(&self) -> &str {
        match self {
            Self::StreamOpened { job_id, .. }
            | Self::StatusChanged { job_id, .. }
            | Self::LogAppended { job_id, .. }
            | Self::StreamClosed { job_id, .. }
            | Self::StreamFailed { job_id, .. } => job_id,
        }
    }
}
