//! AI-enhanced report types and the trigger handshake

use serde::{Deserialize, Serialize};

use crate::report::{Issue, SeveritySummary};

/// Generation status of an enhanced report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancedStatus {
    Processing,
    #[serde(alias = "completed", alias = "ready")]
    Complete,
}

/// AI analysis attached to one file group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(default, alias = "analysis")]
    pub root_cause: String,
    #[serde(default)]
    pub suggested_fix: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub security_impact: String,
    #[serde(default)]
    pub best_practices: Vec<String>,
    /// Set when the analysis for this file failed on the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiAnalysis {
    #[must_use]
    pub fn has_fix(&self) -> bool {
        !self.suggested_fix.trim().is_empty()
    }
}

/// Findings of one file together with their AI analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedFile {
    #[serde(alias = "path")]
    pub file: String,
    #[serde(default)]
    pub issues_analyzed: u64,
    #[serde(default)]
    pub original_issues: Vec<Issue>,
    #[serde(default)]
    pub ai_analysis: AiAnalysis,
}

/// AI-specific counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedSummary {
    #[serde(default)]
    pub total_files_scanned: u64,
    #[serde(default)]
    pub files_with_issues: u64,
    #[serde(default)]
    pub files_analyzed_by_ai: u64,
    #[serde(default)]
    pub issues_analyzed_by_ai: u64,
    #[serde(default)]
    pub ai_fixes_generated: u64,
    #[serde(default)]
    pub severity_breakdown: SeveritySummary,
    #[serde(default = "default_status")]
    pub status: EnhancedStatus,
}

fn default_status() -> EnhancedStatus {
    EnhancedStatus::Complete
}

impl Default for EnhancedSummary {
    fn default() -> Self {
        Self {
            total_files_scanned: 0,
            files_with_issues: 0,
            files_analyzed_by_ai: 0,
            issues_analyzed_by_ai: 0,
            ai_fixes_generated: 0,
            severity_breakdown: SeveritySummary::default(),
            status: EnhancedStatus::Complete,
        }
    }
}

/// Enhanced report metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedMeta {
    #[serde(default)]
    pub ai_model_used: Option<String>,
    #[serde(default)]
    pub min_severity_analyzed: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// AI-augmented analysis of the qualifying subset of a report's findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedReport {
    pub job_id: String,
    #[serde(default = "default_status")]
    pub status: EnhancedStatus,
    #[serde(default, alias = "files")]
    pub enhanced_issues: Vec<EnhancedFile>,
    #[serde(default)]
    pub summary: EnhancedSummary,
    #[serde(default)]
    pub meta: EnhancedMeta,
}

impl EnhancedReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == EnhancedStatus::Complete && self.summary.status == EnhancedStatus::Complete
    }

    /// All original issues across file groups, in order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.enhanced_issues
            .iter()
            .flat_map(|group| group.original_issues.iter())
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.enhanced_issues
            .iter()
            .map(|group| group.original_issues.len())
            .sum()
    }
}

/// Status reported by the enhanced-report trigger endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerStatus {
    /// Generation has just started.
    Processing,
    /// A complete enhanced report already exists.
    #[serde(alias = "completed", alias = "ready")]
    Complete,
    /// The backend declined to run AI analysis for this job.
    Skipped,
}

/// Response of `POST /reports/{job_id}/enhanced/trigger`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub status: TriggerStatus,
    #[serde(default)]
    pub issues_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}
