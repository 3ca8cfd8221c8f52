//! Background consumption of a job's event stream

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use codeagent_errors::StreamError;
use codeagent_events::{AppEvent, EventEmitter, EventSender, FailureContext, JobEvent};
use codeagent_net::ScannerApi;
use codeagent_types::{JobProgress, JobStatus, ProgressEvent};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::tracker::JobTracker;

/// Lifecycle of the underlying event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Open,
    /// Closed deliberately, after a terminal status or by the caller.
    Closed,
    /// Dropped by the server or the network while the job was active.
    Lost,
    /// Could not be opened at all.
    Failed,
}

impl StreamState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Lost => "lost",
            Self::Failed => "failed",
        }
    }

    /// No further events will arrive.
    #[must_use]
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Connecting | Self::Open)
    }
}

/// Point-in-time copy of a subscription's projection
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub progress: Option<JobProgress>,
    pub error: Option<String>,
    pub log: Vec<String>,
    pub stream: StreamState,
}

struct Shared {
    tracker: JobTracker,
    stream: StreamState,
    closed: bool,
    notify: watch::Sender<JobSnapshot>,
    events: Option<EventSender>,
}

impl EventEmitter for Shared {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl Shared {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.tracker.job_id().to_string(),
            status: self.tracker.status(),
            progress: self.tracker.progress().cloned(),
            error: self.tracker.error().map(String::from),
            log: self.tracker.log().lines().to_vec(),
            stream: self.stream,
        }
    }

    fn publish(&self) {
        self.notify.send_replace(self.snapshot());
    }

    fn emit_lines(&self, lines: &[String]) {
        for line in lines {
            self.emit_job_log(self.tracker.job_id(), line.clone());
        }
    }

    fn settle(&mut self, state: StreamState) {
        self.stream = state;
        if state == StreamState::Closed {
            self.emit(AppEvent::Job(JobEvent::StreamClosed {
                job_id: self.tracker.job_id().to_string(),
                final_status: self.tracker.status(),
            }));
        }
    }

    fn fail(&mut self, state: StreamState, line: Option<String>, error: &StreamError) {
        if let Some(line) = line {
            self.emit_lines(std::slice::from_ref(&line));
        }
        self.stream = state;
        self.emit(AppEvent::Job(JobEvent::StreamFailed {
            job_id: self.tracker.job_id().to_string(),
            failure: FailureContext::from_error(error),
        }));
    }
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f` on the shared state unless the subscription was closed.
///
/// The closed flag is checked under the same lock that guards every
/// mutation, so nothing changes once `close` has returned.
fn with_open<R>(shared: &SharedState, f: impl FnOnce(&mut Shared) -> R) -> Option<R> {
    let mut guard = lock(shared);
    if guard.closed {
        return None;
    }
    let result = f(&mut guard);
    guard.publish();
    Some(result)
}

/// A live view of one job fed by its event stream
///
/// Each subscription owns an independent projection; subscribing twice to
/// the same job yields two fresh logs. Dropping the subscription closes it.
pub struct JobSubscription {
    job_id: String,
    shared: SharedState,
    updates: watch::Receiver<JobSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl JobSubscription {
    /// Start consuming the job's event stream on a background task.
    ///
    /// Never fails: problems opening the stream are recorded in the log and
    /// reported through a `StreamFailed` event. Must be called from within a
    /// tokio runtime.
    #[must_use]
    pub fn subscribe(
        api: Arc<ScannerApi>,
        job_id: impl Into<String>,
        events: Option<EventSender>,
    ) -> Self {
        let job_id = job_id.into();
        let tracker = JobTracker::new(job_id.clone());
        let initial = JobSnapshot {
            job_id: job_id.clone(),
            status: None,
            progress: None,
            error: None,
            log: tracker.log().lines().to_vec(),
            stream: StreamState::Connecting,
        };
        let (notify, updates) = watch::channel(initial);
        let shared = Arc::new(Mutex::new(Shared {
            tracker,
            stream: StreamState::Connecting,
            closed: false,
            notify,
            events,
        }));

        {
            let guard = lock(&shared);
            guard.emit_lines(guard.tracker.log().lines());
        }

        let task = match api.events_url(&job_id) {
            Ok(url) => {
                with_open(&shared, |state| {
                    state.emit(AppEvent::Job(JobEvent::StreamOpened {
                        job_id: job_id.clone(),
                        url: url.to_string(),
                    }));
                });
                Some(tokio::spawn(consume(api, job_id.clone(), Arc::clone(&shared))))
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "cannot build event stream URL");
                with_open(&shared, |state| {
                    let line = state.tracker.on_stream_error(&e.to_string());
                    state.fail(StreamState::Failed, Some(line), &e);
                });
                None
            }
        };

        Self {
            job_id,
            shared,
            updates,
            task,
        }
    }

    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Current projection
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        lock(&self.shared).snapshot()
    }

    /// Wait for the next change; returns the new snapshot.
    ///
    /// Once the stream has settled and its final snapshot was seen, no
    /// further change can come, so the final snapshot is returned at once.
    pub async fn changed(&mut self) -> JobSnapshot {
        let unseen = self.updates.has_changed().unwrap_or(false);
        if !unseen && self.updates.borrow().stream.is_settled() {
            return self.updates.borrow().clone();
        }
        // The sender lives in the shared state, so this only fails if the
        // subscription itself is gone.
        let _ = self.updates.changed().await;
        self.updates.borrow_and_update().clone()
    }

    /// Wait until the stream has settled: closed, lost or failed.
    pub async fn wait(&mut self) -> JobSnapshot {
        loop {
            let snapshot = self.updates.borrow_and_update().clone();
            if snapshot.stream.is_settled() {
                return snapshot;
            }
            if self.updates.changed().await.is_err() {
                return self.updates.borrow().clone();
            }
        }
    }

    /// Close the stream now. No log line or event follows this call.
    pub fn close(&mut self) {
        {
            let mut guard = lock(&self.shared);
            if !guard.closed {
                if !guard.stream.is_settled() {
                    guard.settle(StreamState::Closed);
                    guard.publish();
                }
                guard.closed = true;
            }
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }
}

impl Drop for JobSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

async fn consume(api: Arc<ScannerApi>, job_id: String, shared: SharedState) {
    let mut stream = match api.open_events(&job_id).await {
        Ok(stream) => {
            let opened = with_open(&shared, |state| state.stream = StreamState::Open);
            if opened.is_none() {
                return;
            }
            stream
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "failed to open job event stream");
            with_open(&shared, |state| {
                let line = state.tracker.on_stream_error(&e.to_string());
                state.fail(StreamState::Failed, Some(line), &e);
            });
            return;
        }
    };

    loop {
        let next = stream.next_event().await;
        let keep_going = match next {
            Some(Ok(event)) => with_open(&shared, |state| apply_event(state, &event)),
            Some(Err(StreamError::Decode { message })) => {
                tracing::warn!(job_id = %job_id, %message, "skipping malformed job event");
                Some(true)
            }
            Some(Err(e)) => {
                tracing::warn!(job_id = %job_id, error = %e, "job event stream interrupted");
                with_open(&shared, |state| lose(state, &e));
                None
            }
            None => {
                let e = StreamError::Ended;
                with_open(&shared, |state| lose(state, &e));
                None
            }
        };

        if keep_going != Some(true) {
            // Dropping the stream closes the connection.
            return;
        }
    }
}

/// Returns whether the stream should stay open.
fn apply_event(state: &mut Shared, event: &ProgressEvent) -> bool {
    let update = state.tracker.apply(event);
    if let Some(status) = update.status {
        tracing::info!(job_id = state.tracker.job_id(), %status, "job status changed");
        state.emit_job_status(state.tracker.job_id(), status);
    }
    state.emit_lines(&update.lines);

    if state.tracker.is_terminal() {
        state.settle(StreamState::Closed);
        return false;
    }
    true
}

fn lose(state: &mut Shared, error: &StreamError) {
    match state.tracker.on_transport_lost() {
        Some(line) => state.fail(StreamState::Lost, Some(line), error),
        None => state.settle(StreamState::Closed),
    }
}
