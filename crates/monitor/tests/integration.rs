//! Integration tests for monitor crate

#[cfg(test)]
mod tests {
    use codeagent_events::{channel, AppEvent, JobEvent};
    use codeagent_monitor::*;
    use codeagent_net::{FetchPolicy, NetClient, NetConfig, ScannerApi};
    use codeagent_types::{JobStatus, ProgressEvent};
    use httpmock::prelude::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn api_for(base_url: &str) -> Arc<ScannerApi> {
        let config = NetConfig {
            retry_count: 0,
            connect_timeout: Duration::from_secs(2),
            ..NetConfig::default()
        };
        let client = NetClient::new(config).unwrap();
        Arc::new(ScannerApi::new(client, base_url, FetchPolicy::uncached()).unwrap())
    }

    async fn sse_server(path: &str, body: &str) -> MockServer {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(body);
            })
            .await;
        server
    }

    #[tokio::test]
    async fn test_completed_job_closes_without_lost_line() {
        let server = sse_server(
            "/events/j1",
            "data: {\"job_id\":\"j1\",\"status\":\"running\"}\n\n\
             event: progress\ndata: {\"phase\":\"clone\",\"percent\":10}\n\n\
             event: progress\ndata: {\"phase\":\"clone\",\"percent\":20}\n\n\
             event: progress\ndata: {\"phase\":\"analyze:bandit\",\"percent\":60}\n\n\
             event: finished\ndata: {\"status\":\"completed\"}\n\n",
        )
        .await;

        let mut sub = JobSubscription::subscribe(api_for(&server.base_url()), "j1", None);
        let snapshot = sub.wait().await;

        assert_eq!(snapshot.stream, StreamState::Closed);
        assert_eq!(snapshot.status, Some(JobStatus::Completed));
        assert_eq!(
            snapshot.log,
            [
                SEED_LINE,
                "[INFO] Cloning repository",
                "[INFO] Running Bandit analysis",
                COMPLETED_LINE,
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_end_while_running_reports_loss() {
        let server = sse_server(
            "/events/j1",
            "event: progress\ndata: {\"phase\":\"analyze\",\"percent\":40}\n\n\
             data: {\"status\":\"running\"}\n\n",
        )
        .await;

        let (tx, mut rx) = channel();
        let mut sub = JobSubscription::subscribe(api_for(&server.base_url()), "j1", Some(tx));
        let snapshot = sub.wait().await;

        assert_eq!(snapshot.stream, StreamState::Lost);
        assert_eq!(snapshot.log.last().map(String::as_str), Some(CONNECTION_LOST_LINE));

        let mut saw_failure = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, AppEvent::Job(JobEvent::StreamFailed { .. })) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn test_expired_snapshot_settles_stream() {
        let server = sse_server("/events/j1", "data: {\"job_id\":\"j1\",\"status\":\"expired\"}\n\n").await;

        let mut sub = JobSubscription::subscribe(api_for(&server.base_url()), "j1", None);
        let snapshot = sub.wait().await;

        assert_eq!(snapshot.status, Some(JobStatus::Expired));
        assert_ne!(snapshot.stream, StreamState::Lost);
        assert_eq!(snapshot.log, vec![SEED_LINE.to_string(), EXPIRED_LINE.to_string()]);
    }

    #[tokio::test]
    async fn test_failed_job_logs_backend_reason() {
        let server = sse_server(
            "/events/j1",
            "event: finished\ndata: {\"status\":\"failed\",\"error\":\"semgrep crashed\"}\n\n",
        )
        .await;

        let mut sub = JobSubscription::subscribe(api_for(&server.base_url()), "j1", None);
        let snapshot = sub.wait().await;
        assert_eq!(snapshot.stream, StreamState::Closed);
        assert_eq!(
            snapshot.log.last().map(String::as_str),
            Some("[ERROR] Scan failed: semgrep crashed")
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_does_not_propagate() {
        let mut sub = JobSubscription::subscribe(api_for("http://127.0.0.1:1"), "j1", None);
        let snapshot = sub.wait().await;
        assert_eq!(snapshot.stream, StreamState::Failed);
        assert!(snapshot.log[1].starts_with("[ERROR] Could not open job stream"));
    }

    #[tokio::test]
    async fn test_close_stops_all_mutation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/events/j1");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .body("data: {\"status\":\"running\"}\n\n");
            })
            .await;

        let (tx, mut rx) = channel();
        let mut sub = JobSubscription::subscribe(api_for(&server.base_url()), "j1", Some(tx));
        sub.close();
        let closed = sub.snapshot();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(sub.is_closed());
        assert_eq!(sub.snapshot(), closed);
        assert_eq!(closed.log, [SEED_LINE]);
        assert_eq!(closed.stream, StreamState::Closed);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(matches!(
            last,
            Some(AppEvent::Job(JobEvent::StreamClosed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_changed_after_settle_returns_final_snapshot() {
        let server = sse_server("/events/j1", "event: finished\ndata: {\"status\":\"completed\"}\n\n").await;

        let mut sub = JobSubscription::subscribe(api_for(&server.base_url()), "j1", None);
        let settled = sub.wait().await;
        assert_eq!(settled.stream, StreamState::Closed);

        for _ in 0..2 {
            let next = tokio::time::timeout(Duration::from_secs(1), sub.changed())
                .await
                .expect("changed() blocked on a settled stream");
            assert_eq!(next, settled);
        }

        let mut closed = JobSubscription::subscribe(api_for(&server.base_url()), "j1", None);
        closed.close();
        for _ in 0..2 {
            let next = tokio::time::timeout(Duration::from_secs(1), closed.changed())
                .await
                .expect("changed() blocked after close");
            assert_eq!(next.stream, StreamState::Closed);
        }
    }

    #[tokio::test]
    async fn test_resubscribe_starts_fresh_log() {
        let body = "event: progress\ndata: {\"phase\":\"init\",\"percent\":0}\n\n\
                    event: finished\ndata: {\"status\":\"canceled\"}\n\n";
        let server = sse_server("/events/j1", body).await;
        let api = api_for(&server.base_url());

        let mut first = JobSubscription::subscribe(Arc::clone(&api), "j1", None);
        let first_log = first.wait().await.log;
        let mut second = JobSubscription::subscribe(api, "j1", None);
        let second_log = second.wait().await.log;

        assert_eq!(first_log, second_log);
        assert_eq!(
            second_log,
            [SEED_LINE, "[INFO] Initializing scan environment", CANCELED_LINE]
        );
    }

    fn arb_event() -> impl Strategy<Value = ProgressEvent> {
        let phase = prop::sample::select(vec![
            "init",
            "clone",
            "analyze",
            "analyze:semgrep",
            "aggregate",
            "merge",
            "write",
            "custom",
        ]);
        let status = prop::sample::select(vec![
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Canceled,
            JobStatus::Expired,
        ]);
        (
            prop::option::of(status),
            prop::option::of((phase, 0.0f64..100.0)),
            prop::option::of("[a-z ]{0,12}"),
        )
            .prop_map(|(status, progress, error)| {
                let mut event = match progress {
                    Some((phase, percent)) => ProgressEvent::phase(phase, percent),
                    None => ProgressEvent::default(),
                };
                event.status = status;
                event.error = error;
                event
            })
    }

    proptest! {
        #[test]
        fn prop_log_is_append_only(events in prop::collection::vec(arb_event(), 0..40)) {
            let mut tracker = JobTracker::new("j1");
            let mut previous: Vec<String> = tracker.log().lines().to_vec();
            for event in &events {
                tracker.apply(event);
                let current = tracker.log().lines();
                prop_assert!(current.len() >= previous.len());
                prop_assert_eq!(&current[..previous.len()], &previous[..]);
                previous = current.to_vec();
            }
            prop_assert_eq!(tracker.log().lines()[0].as_str(), SEED_LINE);
        }

        #[test]
        fn prop_repeated_phase_logged_once(
            events in prop::collection::vec(arb_event(), 0..20),
            phase in prop::sample::select(vec!["init", "clone", "analyze", "write"]),
        ) {
            let mut tracker = JobTracker::new("j1");
            for event in &events {
                tracker.apply(event);
            }
            let before = tracker.log().len();
            tracker.apply(&ProgressEvent::phase(phase, 10.0));
            let after_first = tracker.log().len();
            let update = tracker.apply(&ProgressEvent::phase(phase, 20.0));
            prop_assert!(update.lines.is_empty());
            prop_assert!(after_first <= before + 1);
        }

        #[test]
        fn prop_no_loss_line_after_terminal(
            events in prop::collection::vec(arb_event(), 0..20),
            terminal in prop::sample::select(vec![
                JobStatus::Completed,
                JobStatus::Failed,
                JobStatus::Canceled,
                JobStatus::Expired,
            ]),
        ) {
            let mut tracker = JobTracker::new("j1");
            for event in &events {
                tracker.apply(event);
            }
            tracker.apply(&ProgressEvent::status(terminal));
            let len = tracker.log().len();
            prop_assert!(tracker.on_transport_lost().is_none());
            prop_assert_eq!(tracker.log().len(), len);
        }
    }
}
