#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for the codeagent CLI
//!
//! This crate sits between the CLI and the specialized crates: it owns the
//! operation context, runs the enhanced report acquisition protocol, and
//! orchestrates exports. Job lookups are thin wrappers that add events.

mod context;
mod enhanced;
mod export;
mod jobs;
mod types;

pub use context::{OpsContextBuilder, OpsCtx};
pub use enhanced::{acquire_enhanced, classify, AcquirePolicy, Acquisition};
pub use export::{export, write_artifact, ExportOutcome, ExportRequest};
pub use jobs::{cancel, health, job_status, list_reports, report_summary, rerun, watch};
pub use types::{ExportSummary, FallbackInfo, WatchSummary};

use codeagent_errors::{Error, OpsError};
use codeagent_types::{HealthResponse, Job, JobAck, ReportList, ReportSummary};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Job snapshot
    Job(Job),
    /// Cancel or rerun acknowledgement
    JobAck(JobAck),
    /// Report severity counts
    ReportSummary(ReportSummary),
    /// Page of stored reports
    Reports(ReportList),
    /// Backend health
    Health(HealthResponse),
    /// Finished export
    Export(ExportSummary),
    /// Settled job subscription
    Watch(WatchSummary),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Job(job) => job.status != codeagent_types::JobStatus::Failed,
            OperationResult::Health(health) => health.status.eq_ignore_ascii_case("ok"),
            OperationResult::Watch(watch) => watch.status == Some(codeagent_types::JobStatus::Completed),
            OperationResult::JobAck(_)
            | OperationResult::ReportSummary(_)
            | OperationResult::Reports(_)
            | OperationResult::Export(_)
            | OperationResult::Success(_) => true,
        }
    }
}
