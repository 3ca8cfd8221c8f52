//! Deterministic artifact naming

use codeagent_types::{ExportFormat, ReportSource};

/// Filename and content type for an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub filename: String,
    pub mime_type: &'static str,
    pub format: ExportFormat,
}

/// A rendered export, held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub content: String,
    pub filename: String,
    pub mime_type: &'static str,
    pub format: ExportFormat,
}

impl ExportArtifact {
    #[must_use]
    pub fn new(config: ExportConfig, content: String) -> Self {
        Self {
            content,
            filename: config.filename,
            mime_type: config.mime_type,
            format: config.format,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Reduce an identifier to `[A-Za-z0-9_-]` so it is safe in a filename.
#[must_use]
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Derive the export filename and MIME type; a pure function of its inputs.
#[must_use]
pub fn resolve(report_id: &str, format: ExportFormat, source: ReportSource) -> ExportConfig {
    let id = sanitize_id(report_id);
    let suffix = match source {
        ReportSource::Baseline => "",
        ReportSource::Enhanced => "-ai-enhanced",
    };
    ExportConfig {
        filename: format!("security-report-{id}{suffix}.{}", format.extension()),
        mime_type: format.mime_type(),
        format,
    }
}
