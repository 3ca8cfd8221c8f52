#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the codeagent scanner client
//!
//! These mirror the JSON shapes served by the scanner backend: jobs and
//! their progress events, baseline reports, AI-enhanced reports, and the
//! export formats the client can produce from them.

pub mod enhanced;
pub mod format;
pub mod job;
pub mod report;

// Re-export commonly used types
pub use enhanced::{
    AiAnalysis, EnhancedFile, EnhancedMeta, EnhancedReport, EnhancedStatus, EnhancedSummary,
    TriggerResponse, TriggerStatus,
};
pub use format::{ExportFormat, ReportSource};
pub use job::{phase_message, Job, JobPhase, JobProgress, JobStatus, ProgressEvent};
pub use report::{
    FileIssues, Issue, RepoInfo, Report, ReportList, ReportListItem, ReportMeta, ReportQuery,
    ReportSummary, Severity, SeveritySummary,
};

use serde::{Deserialize, Serialize};

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub version: String,
}

/// Response of job submission, rerun and cancel endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAck {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<String>,
}
