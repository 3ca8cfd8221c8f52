//! Baseline scan report types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity levels, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Capitalised label used in rendered reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository source information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// "github" or "zip"
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
}

impl RepoInfo {
    /// Best human label for where the scanned code came from.
    #[must_use]
    pub fn display_name(&self) -> String {
        let base = self.url.clone().unwrap_or_else(|| match self.source.as_str() {
            "" => "unknown source".to_string(),
            other => format!("{other} upload"),
        });
        match (&self.git_ref, &self.commit) {
            (_, Some(commit)) => format!("{base} @ {commit}"),
            (Some(git_ref), None) => format!("{base} @ {git_ref}"),
            (None, None) => base,
        }
    }
}

/// Normalized security finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub tool: String,
    #[serde(default, rename = "type")]
    pub issue_type: String,
    pub rule_id: String,
    pub severity: Severity,
    pub file: String,
    #[serde(default)]
    pub line: u32,
    pub message: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Issues grouped by file, in report order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIssues {
    pub path: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Issue counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_issues: Option<u64>,
}

impl SeveritySummary {
    #[must_use]
    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Reported total, falling back to the sum of the per-severity counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total_issues
            .unwrap_or(self.critical + self.high + self.medium + self.low)
    }

    /// Build a summary by counting issues.
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary
    }
}

/// Report metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub repo: RepoInfo,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Complete baseline scan report, immutable once fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub job_id: String,
    #[serde(default)]
    pub meta: ReportMeta,
    #[serde(default)]
    pub summary: SeveritySummary,
    #[serde(default)]
    pub files: Vec<FileIssues>,
}

impl Report {
    /// All issues in file order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.files.iter().flat_map(|file| file.issues.iter())
    }

    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.files.iter().map(|file| file.issues.len()).sum()
    }
}

/// Response of `GET /reports/{job_id}/summary`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub job_id: String,
    pub summary: SeveritySummary,
}

/// One row of `GET /reports`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportListItem {
    pub job_id: String,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub summary: SeveritySummary,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Page of stored reports, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportList {
    #[serde(default)]
    pub items: Vec<ReportListItem>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl ReportList {
    /// Number of pages at the current page size.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// Filters and paging for `GET /reports`; unset fields are left to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub severity: Option<Severity>,
    pub tool: Option<String>,
    pub repo: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub label: Option<String>,
}

impl ReportQuery {
    /// Query-string pairs in a stable order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(severity) = self.severity {
            pairs.push(("severity", severity.as_str().to_string()));
        }
        let text = [
            ("tool", &self.tool),
            ("repo", &self.repo),
            ("since", &self.since),
            ("until", &self.until),
            ("label", &self.label),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs
    }
}
