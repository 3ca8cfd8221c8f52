#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Report encoders and export naming for codeagent
//!
//! Encoders are pure: they turn a baseline [`Report`] or an
//! [`EnhancedReport`] into HTML, CSV, Markdown or JSON text, keeping file
//! and issue order and reproducing the severity summary exactly. The
//! resolver derives a deterministic filename and MIME type for the result.

mod csv;
mod escape;
mod html;
mod json;
mod markdown;
mod resolver;

pub use escape::{
    escape_csv_field, escape_html, escape_markdown_cell, escape_markdown_inline, markdown_fence,
};
pub use resolver::{resolve, sanitize_id, ExportArtifact, ExportConfig};

use codeagent_errors::{Error, ExportError};
use codeagent_types::{EnhancedReport, ExportFormat, Report};

/// Encode a baseline report.
///
/// # Errors
///
/// Returns `ExportError::Encode` if the report cannot be rendered.
pub fn encode_report(report: &Report, format: ExportFormat) -> Result<String, Error> {
    let rendered = match format {
        ExportFormat::Html => html::report(report),
        ExportFormat::Csv => csv::report(report),
        ExportFormat::Markdown => markdown::report(report),
        ExportFormat::Json => return json::encode(report),
    };
    rendered.map_err(|e| encode_error(format, &e))
}

/// Encode an AI-enhanced report, including the analysis of each file group.
///
/// # Errors
///
/// Returns `ExportError::Encode` if the report cannot be rendered.
pub fn encode_enhanced(report: &EnhancedReport, format: ExportFormat) -> Result<String, Error> {
    let rendered = match format {
        ExportFormat::Html => html::enhanced(report),
        ExportFormat::Csv => csv::enhanced(report),
        ExportFormat::Markdown => markdown::enhanced(report),
        ExportFormat::Json => return json::encode(report),
    };
    rendered.map_err(|e| encode_error(format, &e))
}

fn encode_error(format: ExportFormat, err: &std::fmt::Error) -> Error {
    ExportError::Encode {
        format: format.to_string(),
        message: err.to_string(),
    }
    .into()
}
