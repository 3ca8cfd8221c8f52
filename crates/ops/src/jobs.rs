//! Job lookups and lifecycle operations

use std::future::Future;
use std::sync::Arc;

use codeagent_errors::{Error, OpsError};
use codeagent_events::{EventEmitter, FailureContext};
use codeagent_monitor::JobSubscription;
use codeagent_types::{HealthResponse, Job, JobAck, ReportList, ReportQuery, ReportSummary};

use crate::OpsCtx;

pub(crate) fn check_job_id(job_id: &str) -> Result<&str, Error> {
    let trimmed = job_id.trim();
    if trimmed.is_empty() {
        return Err(OpsError::InvalidJobId {
            job_id: job_id.to_string(),
        }
        .into());
    }
    Ok(trimmed)
}

async fn tracked<T, Fut>(ctx: &OpsCtx, operation: &str, fut: Fut) -> Result<T, Error>
where
    Fut: Future<Output = Result<T, Error>>,
{
    ctx.emit_operation_started(operation);
    match fut.await {
        Ok(value) => {
            ctx.emit_operation_completed(operation, true);
            Ok(value)
        }
        Err(e) => {
            ctx.emit_operation_failed(operation, FailureContext::from_error(&e));
            Err(e)
        }
    }
}

/// Current job snapshot; `refresh` bypasses the staleness window.
///
/// # Errors
///
/// Returns an error if the identifier is blank or the backend lookup fails.
pub async fn job_status(ctx: &OpsCtx, job_id: &str, refresh: bool) -> Result<Job, Error> {
    let job_id = check_job_id(job_id)?;
    let job = tracked(ctx, "job_status", ctx.api.get_job(job_id, refresh)).await?;
    if !job.is_consistent() {
        tracing::warn!(
            job_id,
            status = %job.status,
            finished_at = ?job.finished_at,
            "job snapshot has inconsistent finish time"
        );
        ctx.emit_job_warning(job_id, "backend reported an inconsistent finish time");
    }
    Ok(job)
}

/// Start a live subscription to the job's event stream.
///
/// Never fails; stream problems show up in the subscription's log and as
/// `StreamFailed` events. Must be called inside a tokio runtime.
#[must_use]
pub fn watch(ctx: &OpsCtx, job_id: &str) -> JobSubscription {
    tracing::info!(job_id, "watching job");
    JobSubscription::subscribe(Arc::clone(&ctx.api), job_id.trim(), Some(ctx.tx.clone()))
}

/// Cancel a queued or running job.
///
/// # Errors
///
/// Returns an error if the identifier is blank or the backend refuses.
pub async fn cancel(ctx: &OpsCtx, job_id: &str) -> Result<JobAck, Error> {
    let job_id = check_job_id(job_id)?;
    let ack = tracked(ctx, "cancel", ctx.api.cancel_job(job_id)).await?;
    tracing::info!(job_id, "job canceled");
    Ok(ack)
}

/// Re-run a job; the returned ack carries the new job id.
///
/// # Errors
///
/// Returns an error if the identifier is blank or the backend refuses.
pub async fn rerun(ctx: &OpsCtx, job_id: &str) -> Result<JobAck, Error> {
    let job_id = check_job_id(job_id)?;
    let ack = tracked(ctx, "rerun", ctx.api.rerun_job(job_id)).await?;
    tracing::info!(job_id, new_job_id = %ack.job_id, "job re-run");
    Ok(ack)
}

/// Severity counts of a finished job without downloading the full report.
///
/// # Errors
///
/// Returns an error if the identifier is blank or the report is missing.
pub async fn report_summary(ctx: &OpsCtx, job_id: &str) -> Result<ReportSummary, Error> {
    let job_id = check_job_id(job_id)?;
    tracked(ctx, "report_summary", ctx.api.get_report_summary(job_id)).await
}

/// One page of stored reports matching `query`, for finding job ids to export.
///
/// # Errors
///
/// Returns an error if the backend lookup fails.
pub async fn list_reports(ctx: &OpsCtx, query: &ReportQuery) -> Result<ReportList, Error> {
    let list = tracked(ctx, "list_reports", ctx.api.list_reports(query)).await?;
    tracing::debug!(page = list.page, items = list.items.len(), total = list.total, "listed reports");
    Ok(list)
}

/// Backend liveness.
///
/// # Errors
///
/// Returns an error if the backend is unreachable.
pub async fn health(ctx: &OpsCtx) -> Result<HealthResponse, Error> {
    tracked(ctx, "health", ctx.api.health()).await
}
