//! Export format enumeration

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of export formats
///
/// Parsing never fails: unrecognised names resolve to [`ExportFormat::Json`],
/// the representation every consumer can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExportFormat {
    Html,
    Csv,
    Markdown,
    #[default]
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Html, Self::Csv, Self::Markdown, Self::Json];

    /// Case-insensitive parse with the JSON fallback.
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Self::Html,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Json,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Markdown => "markdown",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Csv => "text/csv",
            Self::Markdown => "text/markdown",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for ExportFormat {
    fn from(value: String) -> Self {
        Self::parse_lenient(&value)
    }
}

impl From<ExportFormat> for String {
    fn from(value: ExportFormat) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which report an export artifact was rendered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Baseline,
    Enhanced,
}

impl ReportSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
