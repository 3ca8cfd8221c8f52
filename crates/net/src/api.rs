//! Typed access to the scanner backend endpoints

use std::time::Duration;

use codeagent_config::Config;
use codeagent_errors::{Error, NetworkError, StreamError};
use codeagent_types::{
    EnhancedReport, HealthResponse, Job, JobAck, Report, ReportList, ReportQuery, ReportSummary,
    TriggerResponse,
};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::cache::TtlCache;
use crate::client::{NetClient, NetConfig};
use crate::sse::JobEventStream;

/// Caching rules handed to [`ScannerApi`] by its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Job snapshots younger than this are served without a request.
    pub job_stale_after: Duration,
    /// Reports of completed jobs never change; keep them for the session.
    pub cache_reports: bool,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            job_stale_after: Duration::from_secs(2),
            cache_reports: true,
        }
    }
}

impl FetchPolicy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            job_stale_after: config.job_stale_after(),
            cache_reports: config.network.report_cache,
        }
    }

    /// Policy that always goes to the network.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            job_stale_after: Duration::ZERO,
            cache_reports: false,
        }
    }
}

/// Client for the scanner REST and event-stream surface
pub struct ScannerApi {
    client: NetClient,
    base: Url,
    policy: FetchPolicy,
    jobs: TtlCache<String, Job>,
    reports: TtlCache<String, Report>,
}

impl ScannerApi {
    /// Create an API client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(client: NetClient, base_url: &str, policy: FetchPolicy) -> Result<Self, Error> {
        let mut base = crate::parse_url(base_url)?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl(base_url.to_string()).into());
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            policy,
            jobs: TtlCache::new(),
            reports: TtlCache::new(),
        })
    }

    /// Build the client stack from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL
    /// is invalid.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client = NetClient::new(NetConfig::from_config(config))?;
        Self::new(client, config.api_base_url(), FetchPolicy::from_config(config))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    #[must_use]
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of the job's server-sent event stream
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidUrl` if the URL cannot be formed.
    pub fn events_url(&self, job_id: &str) -> Result<Url, StreamError> {
        self.endpoint(&["events", job_id])
            .map_err(|_| StreamError::InvalidUrl {
                url: format!("{}events/{job_id}", self.base),
            })
    }

    /// Open the job's event stream.
    ///
    /// # Errors
    ///
    /// Returns a `StreamError` if the stream cannot be opened.
    pub async fn open_events(&self, job_id: &str) -> Result<JobEventStream, StreamError> {
        let url = self.events_url(job_id)?;
        tracing::debug!(%url, "opening job event stream");
        let response = self.client.open_event_stream(url.as_str()).await?;
        Ok(JobEventStream::new(response))
    }

    /// Fetch a job snapshot, served from cache inside the staleness window
    /// unless `force` is set.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails or the body is malformed.
    pub async fn get_job(&self, job_id: &str, force: bool) -> Result<Job, Error> {
        let key = job_id.to_string();
        if !force {
            if let Some(job) = self.jobs.get(&key, Some(self.policy.job_stale_after)) {
                tracing::trace!(job_id, "job served from cache");
                return Ok(job);
            }
        }
        let url = self.endpoint(&["jobs", job_id])?;
        let job: Job = self.get_json(&url).await?;
        self.jobs.insert(key, job.clone());
        Ok(job)
    }

    /// Drop any cached snapshot of `job_id`.
    pub fn invalidate_job(&self, job_id: &str) {
        self.jobs.remove(&job_id.to_string());
    }

    /// Fetch the baseline report.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails or the body is malformed.
    pub async fn get_report(&self, job_id: &str) -> Result<Report, Error> {
        let key = job_id.to_string();
        if self.policy.cache_reports {
            if let Some(report) = self.reports.get(&key, None) {
                return Ok(report);
            }
        }
        let url = self.endpoint(&["reports", job_id])?;
        let report: Report = self.get_json(&url).await?;
        if self.policy.cache_reports {
            self.reports.insert(key, report.clone());
        }
        Ok(report)
    }

    fn reports_url(&self, query: &ReportQuery) -> Result<Url, Error> {
        let mut url = self.endpoint(&["reports"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// List stored reports, newest first. Never cached: new scans keep
    /// landing in the list.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails or the body is malformed.
    pub async fn list_reports(&self, query: &ReportQuery) -> Result<ReportList, Error> {
        let url = self.reports_url(query)?;
        self.get_json(&url).await
    }

    /// Fetch the severity summary of a report.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails or the body is malformed.
    pub async fn get_report_summary(&self, job_id: &str) -> Result<ReportSummary, Error> {
        let url = self.endpoint(&["reports", job_id, "summary"])?;
        self.get_json(&url).await
    }

    /// Ask the backend to start (or confirm) enhanced report generation.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Api` carrying the backend status and error code
    /// when the trigger is refused.
    pub async fn trigger_enhanced(&self, job_id: &str) -> Result<TriggerResponse, Error> {
        let url = self.endpoint(&["reports", job_id, "enhanced", "trigger"])?;
        tracing::debug!(%url, "triggering enhanced report");
        let response = self.client.post(url.as_str()).await?;
        Self::decode(response, &url).await
    }

    /// Fetch the enhanced report; fails while it is not generated yet.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Api` carrying the backend status and error code.
    pub async fn get_enhanced(&self, job_id: &str) -> Result<EnhancedReport, Error> {
        let url = self.endpoint(&["reports", job_id, "enhanced"])?;
        self.get_json(&url).await
    }

    /// Cancel a queued or running job.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Api` with status 409 when the job can no longer
    /// be canceled.
    pub async fn cancel_job(&self, job_id: &str) -> Result<JobAck, Error> {
        let url = self.endpoint(&["jobs", job_id])?;
        let response = self.client.delete(url.as_str()).await?;
        let ack = Self::decode(response, &url).await?;
        self.invalidate_job(job_id);
        Ok(ack)
    }

    /// Re-run a job with its original parameters; the ack holds the new id.
    ///
    /// # Errors
    ///
    /// Returns a network error if the backend refuses the rerun.
    pub async fn rerun_job(&self, job_id: &str) -> Result<JobAck, Error> {
        let url = self.endpoint(&["jobs", job_id, "rerun"])?;
        let response = self.client.post(url.as_str()).await?;
        Self::decode(response, &url).await
    }

    /// Backend liveness and version.
    ///
    /// # Errors
    ///
    /// Returns a network error if the backend is unreachable.
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        let url = self.endpoint(&["health"])?;
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, Error> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url.as_str()).await?;
        Self::decode(response, url).await
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, Error> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let err = parse_error_body(status.as_u16(), &text);
            tracing::debug!(%url, status = status.as_u16(), error = %err, "request rejected");
            return Err(err.into());
        }

        serde_json::from_slice(&body).map_err(|e| {
            NetworkError::DecodeFailed {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// Turn an error response body into `NetworkError::Api`.
///
/// Understands the backend envelope `{"error": {"code", "message"}}`, the
/// same envelope nested inside `message`, and the framework's
/// `{"detail": ...}` shape. Inner codes win over the generic outer
/// `HTTP_ERROR` code.
#[must_use]
pub fn parse_error_body(status: u16, body: &str) -> NetworkError {
    let (code, message) = serde_json::from_str::<Value>(body)
        .ok()
        .map(|value| extract_error(&value))
        .unwrap_or_default();

    let message = message.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        }
    });

    NetworkError::Api {
        status,
        code,
        message,
    }
}

fn extract_error(value: &Value) -> (Option<String>, Option<String>) {
    let envelope = value.get("error").or_else(|| value.get("detail"));
    match envelope {
        Some(Value::String(message)) => (None, Some(message.clone())),
        Some(Value::Object(fields)) if fields.contains_key("error") => {
            extract_error(&Value::Object(fields.clone()))
        }
        Some(Value::Object(fields)) => {
            let outer_code = fields.get("code").and_then(Value::as_str).map(String::from);
            match fields.get("message") {
                Some(Value::String(message)) => (outer_code, Some(message.clone())),
                Some(nested @ Value::Object(_)) => {
                    let (inner_code, message) = extract_error(nested);
                    let code = match (inner_code, outer_code) {
                        (Some(inner), _) => Some(inner),
                        (None, outer) => outer,
                    };
                    (code, message)
                }
                _ => (outer_code, None),
            }
        }
        _ => (None, None),
    }
}
