//! Export orchestration and artifact persistence

use std::io::Write;
use std::path::{Path, PathBuf};

use codeagent_errors::{EnhancedError, Error, ExportError};
use codeagent_events::{AppEvent, EventEmitter, ExportEvent, FailureContext};
use codeagent_export::{encode_enhanced, encode_report, resolve, ExportArtifact};
use codeagent_types::{ExportFormat, Report, ReportSource};

use crate::enhanced::{acquire_enhanced, Acquisition};
use crate::OpsCtx;

/// What to export
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub job_id: String,
    pub format: ExportFormat,
    pub include_enhanced: bool,
    /// Baseline report the caller already holds; fetched when absent.
    pub report: Option<Report>,
}

impl ExportRequest {
    #[must_use]
    pub fn new(job_id: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            job_id: job_id.into(),
            format,
            include_enhanced: false,
            report: None,
        }
    }

    #[must_use]
    pub fn with_enhanced(mut self, include_enhanced: bool) -> Self {
        self.include_enhanced = include_enhanced;
        self
    }

    #[must_use]
    pub fn with_report(mut self, report: Report) -> Self {
        self.report = Some(report);
        self
    }
}

/// A finished export and which report it was built from
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub artifact: ExportArtifact,
    pub source: ReportSource,
    /// Set when enhanced data was requested but the baseline was used.
    pub fallback: Option<EnhancedError>,
}

impl ExportOutcome {
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Encode a report into an in-memory artifact.
///
/// With `include_enhanced`, runs the acquisition protocol first and falls
/// back to the baseline report when it yields nothing; the substitution is
/// reported in [`ExportOutcome::fallback`], not as an error.
///
/// # Errors
///
/// Returns an error if the baseline report cannot be fetched or encoding
/// fails.
pub async fn export(ctx: &OpsCtx, request: ExportRequest) -> Result<ExportOutcome, Error> {
    let job_id = crate::jobs::check_job_id(&request.job_id)?.to_string();
    ctx.emit(AppEvent::Export(ExportEvent::Started {
        job_id: job_id.clone(),
        format: request.format,
        include_enhanced: request.include_enhanced,
    }));

    match build(ctx, &job_id, request).await {
        Ok(outcome) => {
            tracing::info!(
                job_id = %job_id,
                filename = %outcome.artifact.filename,
                source = %outcome.source,
                bytes = outcome.artifact.len(),
                "export ready"
            );
            ctx.emit(AppEvent::Export(ExportEvent::Completed {
                job_id,
                filename: outcome.artifact.filename.clone(),
                source: outcome.source,
                bytes: outcome.artifact.len(),
            }));
            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "export failed");
            ctx.emit(AppEvent::Export(ExportEvent::Failed {
                job_id,
                failure: FailureContext::from_error(&e),
            }));
            Err(e)
        }
    }
}

async fn build(ctx: &OpsCtx, job_id: &str, request: ExportRequest) -> Result<ExportOutcome, Error> {
    let ExportRequest {
        format,
        include_enhanced,
        report,
        ..
    } = request;

    let acquisition = if include_enhanced {
        Some(acquire_enhanced(ctx, job_id).await)
    } else {
        None
    };

    let (content, source, fallback) = match acquisition {
        Some(Acquisition::Enhanced(enhanced)) => (
            encode_enhanced(&enhanced, format)?,
            ReportSource::Enhanced,
            None,
        ),
        Some(Acquisition::Fallback(reason)) => {
            let report = baseline(ctx, job_id, report).await?;
            (encode_report(&report, format)?, ReportSource::Baseline, Some(reason))
        }
        None => {
            let report = baseline(ctx, job_id, report).await?;
            (encode_report(&report, format)?, ReportSource::Baseline, None)
        }
    };

    let config = resolve(job_id, format, source);
    Ok(ExportOutcome {
        artifact: ExportArtifact::new(config, content),
        source,
        fallback,
    })
}

async fn baseline(ctx: &OpsCtx, job_id: &str, held: Option<Report>) -> Result<Report, Error> {
    match held {
        Some(report) => Ok(report),
        None => ctx.api.get_report(job_id).await,
    }
}

/// Write an artifact into `dir` under its own filename.
///
/// The content goes to a temporary file in the same directory which is
/// then renamed over the target, so a failed write never leaves a partial
/// export behind.
///
/// # Errors
///
/// Returns `ExportError::Write` if the directory is not writable or the
/// rename fails.
pub async fn write_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf, Error> {
    let target = dir.join(&artifact.filename);
    let content = artifact.content.clone();
    let dir = dir.to_path_buf();
    let path = target.clone();

    tokio::task::spawn_blocking(move || persist(&dir, &path, content.as_bytes()))
        .await
        .map_err(|e| Error::internal(format!("export writer task failed: {e}")))??;

    tracing::debug!(path = %target.display(), "export written");
    Ok(target)
}

fn persist(dir: &Path, target: &Path, content: &[u8]) -> Result<(), Error> {
    let write_error = |message: String| -> Error {
        ExportError::Write {
            path: target.display().to_string(),
            message,
        }
        .into()
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    file.write_all(content)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| write_error(e.to_string()))?;
    file.persist(target)
        .map_err(|e| write_error(e.error.to_string()))?;
    Ok(())
}
