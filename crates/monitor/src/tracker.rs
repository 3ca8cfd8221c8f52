//! Status and log reconstruction from progress events

use codeagent_types::{phase_message, JobProgress, JobStatus, ProgressEvent};

/// First line of every fresh log
pub const SEED_LINE: &str = "[INFO] Waiting for job updates...";
pub const COMPLETED_LINE: &str = "[SUCCESS] Scan completed successfully";
pub const CANCELED_LINE: &str = "[WARN] Scan was canceled";
pub const EXPIRED_LINE: &str = "[WARN] Scan expired before it finished";
pub const CONNECTION_LOST_LINE: &str = "[WARN] Connection to job stream lost";

/// Append-only sequence of human-readable lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLog {
    lines: Vec<String>,
}

impl Default for JobLog {
    fn default() -> Self {
        Self {
            lines: vec![SEED_LINE.to_string()],
        }
    }
}

impl JobLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false: the seed line is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What a single event changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerUpdate {
    /// New status when it differs from the previous one.
    pub status: Option<JobStatus>,
    /// Lines appended by this event, in order.
    pub lines: Vec<String>,
}

impl TrackerUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.lines.is_empty()
    }
}

/// Client-side projection of one job, fed by progress events
#[derive(Debug, Clone)]
pub struct JobTracker {
    job_id: String,
    status: Option<JobStatus>,
    progress: Option<JobProgress>,
    error: Option<String>,
    log: JobLog,
    announced: Vec<JobStatus>,
}

impl JobTracker {
    #[must_use]
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: None,
            progress: None,
            error: None,
            log: JobLog::new(),
            announced: Vec::new(),
        }
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    #[must_use]
    pub fn status(&self) -> Option<JobStatus> {
        self.status
    }

    #[must_use]
    pub fn progress(&self) -> Option<&JobProgress> {
        self.progress.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn log(&self) -> &JobLog {
        &self.log
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(JobStatus::is_terminal)
    }

    /// Fold one event into the projection.
    ///
    /// Status is last-write-wins. A phase message is appended unless the
    /// previous line already contains it. Terminal transitions announce
    /// themselves at most once each.
    pub fn apply(&mut self, event: &ProgressEvent) -> TrackerUpdate {
        let mut update = TrackerUpdate::default();

        if let Some(error) = &event.error {
            self.error = Some(error.clone());
        }

        if let Some(progress) = &event.progress {
            self.progress = Some(progress.clone());
            let message = phase_message(&progress.phase);
            let repeated = self
                .log
                .last()
                .is_some_and(|last| last.contains(message.as_ref()));
            if !repeated {
                update.lines.push(self.append(format!("[INFO] {message}")));
            }
        }

        if let Some(status) = event.status {
            let previous = self.status.replace(status);
            if previous != Some(status) {
                update.status = Some(status);
                if let Some(line) = self.terminal_line(status, event.error.as_deref()) {
                    update.lines.push(self.append(line));
                }
            }
        }

        update
    }

    /// Record loss of the event stream. Ignored once the job is terminal.
    pub fn on_transport_lost(&mut self) -> Option<String> {
        if self.is_terminal() {
            return None;
        }
        Some(self.append(CONNECTION_LOST_LINE.to_string()))
    }

    /// Record that the event stream could not be opened.
    pub fn on_stream_error(&mut self, message: &str) -> String {
        self.append(format!("[ERROR] Could not open job stream: {message}"))
    }

    fn terminal_line(&mut self, status: JobStatus, error: Option<&str>) -> Option<String> {
        if !status.is_terminal() || self.announced.contains(&status) {
            return None;
        }
        self.announced.push(status);
        let line = match status {
            JobStatus::Completed => COMPLETED_LINE.to_string(),
            JobStatus::Failed => {
                let reason = error.or(self.error.as_deref()).unwrap_or("Unknown error");
                format!("[ERROR] Scan failed: {reason}")
            }
            JobStatus::Canceled => CANCELED_LINE.to_string(),
            JobStatus::Expired => EXPIRED_LINE.to_string(),
            JobStatus::Queued | JobStatus::Running => return None,
        };
        Some(line)
    }

    fn append(&mut self, line: String) -> String {
        self.log.push(line.clone());
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_log() {
        let tracker = JobTracker::new("j1");
        assert_eq!(tracker.log().lines(), [SEED_LINE]);
        assert_eq!(tracker.status(), None);
    }

    #[test]
    fn test_repeated_phase_suppressed() {
        let mut tracker = JobTracker::new("j1");
        tracker.apply(&ProgressEvent::phase("clone", 10.0));
        let update = tracker.apply(&ProgressEvent::phase("clone", 20.0));
        assert!(update.lines.is_empty());
        assert_eq!(tracker.progress().map(|p| p.percent), Some(20.0));
        assert_eq!(
            tracker.log().lines(),
            [SEED_LINE, "[INFO] Cloning repository"]
        );
    }

    #[test]
    fn test_unknown_phase_passes_through() {
        let mut tracker = JobTracker::new("j1");
        tracker.apply(&ProgressEvent::phase("analyze:trivy", 50.0));
        assert_eq!(tracker.log().last(), Some("[INFO] analyze:trivy"));
    }

    #[test]
    fn test_completion_announced_once() {
        let mut tracker = JobTracker::new("j1");
        tracker.apply(&ProgressEvent::status(JobStatus::Running));
        tracker.apply(&ProgressEvent::status(JobStatus::Completed));
        tracker.apply(&ProgressEvent::status(JobStatus::Completed));
        let completions = tracker
            .log()
            .lines()
            .iter()
            .filter(|l| l.as_str() == COMPLETED_LINE)
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_failure_line_uses_error_or_placeholder() {
        let mut tracker = JobTracker::new("j1");
        tracker.apply(&ProgressEvent::failed(Some("clone failed".into())));
        assert_eq!(tracker.log().last(), Some("[ERROR] Scan failed: clone failed"));

        let mut tracker = JobTracker::new("j2");
        tracker.apply(&ProgressEvent::failed(None));
        assert_eq!(tracker.log().last(), Some("[ERROR] Scan failed: Unknown error"));
    }

    #[test]
    fn test_transport_loss_only_while_active() {
        let mut tracker = JobTracker::new("j1");
        tracker.apply(&ProgressEvent::status(JobStatus::Running));
        assert_eq!(
            tracker.on_transport_lost().as_deref(),
            Some(CONNECTION_LOST_LINE)
        );

        let mut tracker = JobTracker::new("j2");
        tracker.apply(&ProgressEvent::status(JobStatus::Canceled));
        assert_eq!(tracker.log().last(), Some(CANCELED_LINE));
        assert_eq!(tracker.on_transport_lost(), None);
    }

    #[test]
    fn test_expired_is_terminal_and_announced_once() {
        let mut tracker = JobTracker::new("j1");
        tracker.apply(&ProgressEvent::status(JobStatus::Running));
        let update = tracker.apply(&ProgressEvent::status(JobStatus::Expired));
        assert_eq!(update.lines, [EXPIRED_LINE]);
        tracker.apply(&ProgressEvent::status(JobStatus::Expired));

        assert!(tracker.is_terminal());
        assert_eq!(tracker.on_transport_lost(), None);
        assert_eq!(tracker.log().lines(), [SEED_LINE, EXPIRED_LINE]);
    }

    #[test]
    fn test_phase_and_status_in_one_event() {
        let mut tracker = JobTracker::new("j1");
        let update =
            tracker.apply(&ProgressEvent::phase("write", 100.0).with_status(JobStatus::Completed));
        assert_eq!(update.status, Some(JobStatus::Completed));
        assert_eq!(update.lines, ["[INFO] Writing report", COMPLETED_LINE]);
    }
}
