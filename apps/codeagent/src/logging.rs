//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so
//! `--debug` log files carry the same information the terminal shows.

use codeagent_events::{AppEvent, EventMessage, ExportEvent, GeneralEvent, JobEvent};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    details = ?details,
                    "{message}"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    "Operation started"
                );
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    success = success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Operation failed"
                );
            }
        },

        AppEvent::Job(event) => match event {
            JobEvent::StreamOpened { job_id, url } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    url = %url,
                    "Job stream opened"
                );
            }
            JobEvent::StatusChanged { job_id, status } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    status = %status,
                    "Job status changed"
                );
            }
            JobEvent::LogAppended { job_id, line } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    line = %line,
                    "Job log line"
                );
            }
            JobEvent::StreamClosed {
                job_id,
                final_status,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    final_status = ?final_status,
                    "Job stream closed"
                );
            }
            JobEvent::StreamFailed { job_id, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Job stream failed"
                );
            }
        },

        AppEvent::Export(event) => match event {
            ExportEvent::Started {
                job_id,
                format,
                include_enhanced,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    format = %format,
                    include_enhanced = include_enhanced,
                    "Export started"
                );
            }
            ExportEvent::EnhancedTriggered { job_id, status } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    status = ?status,
                    "Enhanced report triggered"
                );
            }
            ExportEvent::EnhancedFallback {
                job_id,
                reason,
                failure,
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    reason = %reason,
                    code = ?failure.code,
                    message = %failure.message,
                    "Enhanced report unavailable, exporting baseline"
                );
            }
            ExportEvent::Completed {
                job_id,
                filename,
                source,
                bytes,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    filename = %filename,
                    report = %source,
                    bytes = bytes,
                    "Export completed"
                );
            }
            ExportEvent::Failed { job_id, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    job_id = %job_id,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Export failed"
                );
            }
        },
    }
}
