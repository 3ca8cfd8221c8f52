//! Types for operations and results

use std::path::PathBuf;

use codeagent_errors::{EnhancedError, UserFacingError};
use codeagent_monitor::JobSnapshot;
use codeagent_types::{ExportFormat, JobStatus, ReportSource};
use serde::{Deserialize, Serialize};

use crate::ExportOutcome;

/// Why an enhanced export used the baseline report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackInfo {
    /// Stable reason key such as `in_progress` or `not_configured`
    pub reason: String,
    pub message: String,
    pub hint: Option<String>,
}

impl From<&EnhancedError> for FallbackInfo {
    fn from(err: &EnhancedError) -> Self {
        Self {
            reason: err.reason().as_str().to_string(),
            message: err.user_message().into_owned(),
            hint: err.user_hint().map(str::to_string),
        }
    }
}

/// Export report for CLI output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportSummary {
    pub job_id: String,
    pub filename: String,
    pub mime_type: String,
    pub format: ExportFormat,
    pub source: ReportSource,
    pub bytes: usize,
    /// Where the artifact was written; `None` when printed to stdout
    pub path: Option<PathBuf>,
    pub fallback: Option<FallbackInfo>,
}

impl ExportSummary {
    #[must_use]
    pub fn new(job_id: impl Into<String>, outcome: &ExportOutcome, path: Option<PathBuf>) -> Self {
        Self {
            job_id: job_id.into(),
            filename: outcome.artifact.filename.clone(),
            mime_type: outcome.artifact.mime_type.to_string(),
            format: outcome.artifact.format,
            source: outcome.source,
            bytes: outcome.artifact.len(),
            path,
            fallback: outcome.fallback.as_ref().map(FallbackInfo::from),
        }
    }
}

/// How a watched job ended up when the subscription settled
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchSummary {
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub error: Option<String>,
    /// `closed`, `lost` or `failed`
    pub stream: String,
    pub log: Vec<String>,
}

impl From<&JobSnapshot> for WatchSummary {
    fn from(snapshot: &JobSnapshot) -> Self {
        Self {
            job_id: snapshot.job_id.clone(),
            status: snapshot.status,
            error: snapshot.error.clone(),
            stream: snapshot.stream.as_str().to_string(),
            log: snapshot.log.clone(),
        }
    }
}
