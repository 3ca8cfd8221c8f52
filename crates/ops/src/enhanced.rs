//! Enhanced report acquisition
//!
//! One bounded trigger-and-wait cycle: trigger generation, wait a grace delay
//! if the backend just started, then fetch. Every failure is classified into
//! [`EnhancedError`] and turned into a fallback to the baseline report; the
//! caller never sees an acquisition error.

use std::time::Duration;

use codeagent_config::Config;
use codeagent_errors::{EnhancedError, Error, UserFacingError};
use codeagent_events::{AppEvent, EventEmitter, ExportEvent, FailureContext};
use codeagent_types::{EnhancedReport, ReportSource, TriggerResponse, TriggerStatus};

use crate::OpsCtx;

/// Timing of the acquisition protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquirePolicy {
    /// Wait after a `processing` trigger before the first fetch.
    pub grace_delay: Duration,
    /// Fetches before giving up; 1 means single-shot then fallback.
    pub fetch_attempts: u32,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self {
            grace_delay: Duration::from_secs(2),
            fetch_attempts: 1,
        }
    }
}

impl AcquirePolicy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            grace_delay: config.grace_delay(),
            fetch_attempts: config.enhanced.fetch_attempts.max(1),
        }
    }
}

/// Result of an acquisition: always one of the two
#[derive(Debug, Clone)]
pub enum Acquisition {
    Enhanced(EnhancedReport),
    /// Use the baseline report; carries why the enhanced one was unusable.
    Fallback(EnhancedError),
}

impl Acquisition {
    #[must_use]
    pub fn source(&self) -> ReportSource {
        match self {
            Self::Enhanced(_) => ReportSource::Enhanced,
            Self::Fallback(_) => ReportSource::Baseline,
        }
    }

    #[must_use]
    pub fn fallback_reason(&self) -> Option<&EnhancedError> {
        match self {
            Self::Enhanced(_) => None,
            Self::Fallback(reason) => Some(reason),
        }
    }
}

/// Map a failure of the trigger or fetch call onto the unavailability
/// taxonomy. Backend error codes take precedence over HTTP status.
#[must_use]
pub fn classify(err: &Error) -> EnhancedError {
    let net = match err {
        Error::Network(net) => net,
        Error::Enhanced(enhanced) => return enhanced.clone(),
        other => {
            return EnhancedError::Unavailable {
                message: other.to_string(),
            }
        }
    };

    let message = net.user_message().into_owned();
    match net.api_code() {
        Some("NOT_READY" | "NOT_FOUND" | "PROCESSING") => return EnhancedError::InProgress,
        Some("AI_NOT_CONFIGURED" | "AI_DISABLED") => {
            return EnhancedError::NotConfigured { message }
        }
        Some("NO_QUALIFYING_ISSUES") => return EnhancedError::NoQualifyingIssues { message },
        _ => {}
    }

    match net.status() {
        Some(404) => EnhancedError::InProgress,
        Some(501 | 503) => EnhancedError::NotConfigured { message },
        _ => EnhancedError::Unavailable {
            message: err.to_string(),
        },
    }
}

/// Classify a successful trigger answer that still rules out a fetch.
fn classify_trigger(trigger: &TriggerResponse) -> Option<EnhancedError> {
    let nothing_to_analyze = trigger.status == TriggerStatus::Skipped
        || (trigger.status == TriggerStatus::Processing && trigger.issues_count == Some(0));
    nothing_to_analyze.then(|| EnhancedError::NoQualifyingIssues {
        message: trigger
            .message
            .clone()
            .unwrap_or_else(|| "no issues met the AI severity threshold".to_string()),
    })
}

/// Acquire the enhanced report for a job, or the reason to fall back.
///
/// Runs trigger, optional grace delay and fetch strictly in sequence and
/// always resolves. Emits `EnhancedTriggered` once the trigger answers and
/// `EnhancedFallback` when the baseline report must be used.
pub async fn acquire_enhanced(ctx: &OpsCtx, job_id: &str) -> Acquisition {
    let policy = AcquirePolicy::from_config(&ctx.config);
    match try_acquire(ctx, job_id, policy).await {
        Ok(report) => {
            tracing::info!(
                job_id,
                files = report.enhanced_issues.len(),
                "enhanced report acquired"
            );
            Acquisition::Enhanced(report)
        }
        Err(reason) => {
            tracing::warn!(
                job_id,
                reason = reason.reason().as_str(),
                error = %reason,
                "enhanced report unavailable, using baseline report"
            );
            ctx.emit(AppEvent::Export(ExportEvent::EnhancedFallback {
                job_id: job_id.to_string(),
                reason: reason.reason().as_str().to_string(),
                failure: FailureContext::from_error(&reason),
            }));
            Acquisition::Fallback(reason)
        }
    }
}

async fn try_acquire(
    ctx: &OpsCtx,
    job_id: &str,
    policy: AcquirePolicy,
) -> Result<EnhancedReport, EnhancedError> {
    let trigger = ctx
        .api
        .trigger_enhanced(job_id)
        .await
        .map_err(|e| classify(&e))?;

    tracing::debug!(
        job_id,
        status = ?trigger.status,
        issues_count = ?trigger.issues_count,
        "enhanced report triggered"
    );
    ctx.emit(AppEvent::Export(ExportEvent::EnhancedTriggered {
        job_id: job_id.to_string(),
        status: trigger.status,
    }));

    if let Some(reason) = classify_trigger(&trigger) {
        return Err(reason);
    }
    if trigger.status == TriggerStatus::Processing {
        tokio::time::sleep(policy.grace_delay).await;
    }

    let mut last = EnhancedError::InProgress;
    for attempt in 1..=policy.fetch_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.grace_delay).await;
        }
        match ctx.api.get_enhanced(job_id).await {
            Ok(report) if report.is_complete() => return Ok(report),
            Ok(_) => last = EnhancedError::InProgress,
            Err(e) => {
                last = classify(&e);
                if !matches!(last, EnhancedError::InProgress) {
                    return Err(last);
                }
            }
        }
        tracing::debug!(job_id, attempt, "enhanced report not ready");
        ctx.emit_debug(
            "enhanced report not ready",
            [("job_id", job_id.to_string()), ("attempt", attempt.to_string())],
        );
    }
    Err(last)
}
