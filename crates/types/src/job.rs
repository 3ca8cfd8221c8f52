//! Job lifecycle and progress event types

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a scan job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    #[serde(alias = "cancelled")]
    Canceled,
    /// Removed by the backend's retention sweep
    Expired,
}

impl JobStatus {
    /// Terminal states accept no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Canceled | Self::Expired
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known execution phases, in the order the backend runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobPhase {
    Init,
    Clone,
    Analyze,
    AnalyzeSemgrep,
    AnalyzeBandit,
    AnalyzeDepcheck,
    Aggregate,
    Merge,
    Write,
}

impl JobPhase {
    /// Parse a backend phase label; unknown labels yield `None`.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let phase = match label {
            "init" => Self::Init,
            "clone" => Self::Clone,
            "analyze" => Self::Analyze,
            "analyze:semgrep" => Self::AnalyzeSemgrep,
            "analyze:bandit" => Self::AnalyzeBandit,
            "analyze:depcheck" => Self::AnalyzeDepcheck,
            "aggregate" => Self::Aggregate,
            "merge" => Self::Merge,
            "write" => Self::Write,
            _ => return None,
        };
        Some(phase)
    }

    /// Canonical human-readable message for this phase.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Init => "Initializing scan environment",
            Self::Clone => "Cloning repository",
            Self::Analyze => "Running security analyzers",
            Self::AnalyzeSemgrep => "Running Semgrep analysis",
            Self::AnalyzeBandit => "Running Bandit analysis",
            Self::AnalyzeDepcheck => "Checking dependencies for known vulnerabilities",
            Self::Aggregate | Self::Merge => "Aggregating results",
            Self::Write => "Writing report",
        }
    }
}

/// Map a phase label to its log message, passing unknown labels through.
#[must_use]
pub fn phase_message(label: &str) -> Cow<'_, str> {
    match JobPhase::parse(label) {
        Some(phase) => Cow::Borrowed(phase.message()),
        None => Cow::Borrowed(label),
    }
}

/// Phase name plus completion percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub phase: String,
    #[serde(default)]
    pub percent: f64,
}

/// Client-side projection of a backend job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(alias = "id")]
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<JobProgress>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Job {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `finished_at` must be set exactly when the status is terminal.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.finished_at.is_some() == self.is_terminal()
    }
}

/// Point-in-time snapshot pushed over the job event stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub progress: Option<JobProgress>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressEvent {
    #[must_use]
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn phase(phase: impl Into<String>, percent: f64) -> Self {
        Self {
            progress: Some(JobProgress {
                phase: phase.into(),
                percent,
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(error: Option<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<&Job> for ProgressEvent {
    fn from(job: &Job) -> Self {
        Self {
            status: Some(job.status),
            progress: job.progress.clone(),
            error: job.error.clone(),
        }
    }
}
