//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use codeagent_config::Config;
    use codeagent_errors::{EnhancedError, Error, NetworkError, UnavailableReason};
    use codeagent_events::{AppEvent, EventReceiver, ExportEvent, GeneralEvent};
    use codeagent_net::{FetchPolicy, NetClient, NetConfig, ScannerApi};
    use codeagent_ops::*;
    use codeagent_types::{ExportFormat, ReportQuery, ReportSource, Severity, TriggerStatus};
    use httpmock::prelude::*;

    const REPORT: &str = r#"{
        "job_id": "j1",
        "meta": {"tools": ["semgrep", "bandit"], "repo": {"source": "github"}},
        "summary": {"critical": 1, "high": 2, "medium": 0, "low": 0},
        "files": [
            {"path": "app.py", "issues": [
                {"tool": "semgrep", "type": "sast", "rule_id": "eval-use", "severity": "critical",
                 "file": "app.py", "line": 3, "message": "eval on user input"},
                {"tool": "bandit", "type": "sast", "rule_id": "B602", "severity": "high",
                 "file": "app.py", "line": 9, "message": "shell=True, with \"quotes\""}
            ]},
            {"path": "db.py", "issues": [
                {"tool": "semgrep", "type": "sast", "rule_id": "sql-concat", "severity": "high",
                 "file": "db.py", "line": 14, "message": "string-built SQL"}
            ]}
        ]
    }"#;

    const ENHANCED: &str = r#"{
        "job_id": "j1",
        "status": "complete",
        "enhanced_issues": [{
            "file": "app.py",
            "issues_analyzed": 1,
            "original_issues": [
                {"tool": "semgrep", "type": "sast", "rule_id": "eval-use", "severity": "critical",
                 "file": "app.py", "line": 3, "message": "eval on user input"}
            ],
            "ai_analysis": {
                "root_cause": "Request data reaches eval",
                "suggested_fix": "Use ast.literal_eval",
                "explanation": "eval executes arbitrary code",
                "security_impact": "Remote code execution",
                "best_practices": ["Never eval input"]
            }
        }],
        "summary": {"files_analyzed_by_ai": 1, "issues_analyzed_by_ai": 1,
                    "severity_breakdown": {"critical": 1}, "status": "complete"},
        "meta": {"ai_model_used": "gpt-4o-mini"}
    }"#;

    fn ctx(server: &MockServer, grace: Duration, attempts: u32) -> (OpsCtx, EventReceiver) {
        let net = NetConfig {
            retry_count: 0,
            timeout: Duration::from_secs(5),
            ..NetConfig::default()
        };
        let client = NetClient::new(net).unwrap();
        let api = ScannerApi::new(client, &server.base_url(), FetchPolicy::uncached()).unwrap();

        let mut config = Config::default();
        config.enhanced.grace_delay_ms = u64::try_from(grace.as_millis()).unwrap();
        config.enhanced.fetch_attempts = attempts;

        let (tx, rx) = codeagent_events::channel();
        let ctx = OpsContextBuilder::new()
            .with_api(Arc::new(api))
            .with_event_sender(tx)
            .with_config(config)
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn mock_report(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reports/j1");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(REPORT);
            })
            .await
    }

    #[tokio::test]
    async fn test_processing_then_not_ready_falls_back_to_baseline() {
        let server = MockServer::start_async().await;
        let trigger = server
            .mock_async(|when, then| {
                when.method(POST).path("/reports/j1/enhanced/trigger");
                then.status(200)
                    .body(r#"{"status":"processing","issues_count":5}"#);
            })
            .await;
        let enhanced = server
            .mock_async(|when, then| {
                when.method(GET).path("/reports/j1/enhanced");
                then.status(404).body(
                    r#"{"error":{"code":"HTTP_ERROR","message":"Enhanced report not found"}}"#,
                );
            })
            .await;
        mock_report(&server).await;

        let (ctx, mut rx) = ctx(&server, Duration::from_millis(100), 1);
        let started = Instant::now();
        let outcome = export(
            &ctx,
            ExportRequest::new("j1", ExportFormat::Csv).with_enhanced(true),
        )
        .await
        .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        trigger.assert_async().await;
        assert_eq!(enhanced.hits_async().await, 1);

        assert_eq!(outcome.source, ReportSource::Baseline);
        assert!(matches!(outcome.fallback, Some(EnhancedError::InProgress)));
        assert_eq!(outcome.artifact.filename, "security-report-j1.csv");
        assert_eq!(outcome.artifact.mime_type, "text/csv");
        assert_eq!(outcome.artifact.content.lines().count(), 4);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Export(ExportEvent::EnhancedTriggered { status: TriggerStatus::Processing, .. })
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Export(ExportEvent::EnhancedFallback { reason, .. }) if reason == "in_progress"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Export(ExportEvent::Completed { source: ReportSource::Baseline, .. })
        )));
    }

    #[tokio::test]
    async fn test_ready_enhanced_report_is_used() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/reports/j1/enhanced/trigger");
                then.status(200).body(r#"{"status":"completed"}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reports/j1/enhanced");
                then.status(200).body(ENHANCED);
            })
            .await;
        let baseline = mock_report(&server).await;

        let (ctx, _rx) = ctx(&server, Duration::from_secs(30), 1);
        let outcome = export(
            &ctx,
            ExportRequest::new("j1", ExportFormat::Markdown).with_enhanced(true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.source, ReportSource::Enhanced);
        assert!(!outcome.used_fallback());
        assert_eq!(outcome.artifact.filename, "security-report-j1-ai-enhanced.md");
        assert_eq!(outcome.artifact.mime_type, "text/markdown");
        assert!(outcome.artifact.content.contains("Request data reaches eval"));
        assert!(outcome.artifact.content.contains("Never eval input"));
        assert_eq!(baseline.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_not_configured_skips_the_fetch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/reports/j1/enhanced/trigger");
                then.status(503).body(
                    r#"{"error":{"code":"AI_NOT_CONFIGURED","message":"No AI model configured"}}"#,
                );
            })
            .await;
        let enhanced = server
            .mock_async(|when, then| {
                when.method(GET).path("/reports/j1/enhanced");
                then.status(200).body(ENHANCED);
            })
            .await;
        mock_report(&server).await;

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        let outcome = export(
            &ctx,
            ExportRequest::new("j1", ExportFormat::Html).with_enhanced(true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.source, ReportSource::Baseline);
        let reason = outcome.fallback.as_ref().unwrap();
        assert_eq!(reason.reason(), UnavailableReason::NotConfigured);
        assert_eq!(enhanced.hits_async().await, 0);
        assert!(outcome.artifact.content.starts_with("<!DOCTYPE html>"));

        let summary = ExportSummary::new("j1", &outcome, None);
        let info = summary.fallback.unwrap();
        assert_eq!(info.reason, "not_configured");
        assert!(info.hint.is_some());
    }

    #[tokio::test]
    async fn test_skipped_trigger_means_no_qualifying_issues() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/reports/j1/enhanced/trigger");
                then.status(200)
                    .body(r#"{"status":"skipped","issues_count":0,"message":"Nothing above medium"}"#);
            })
            .await;

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        match acquire_enhanced(&ctx, "j1").await {
            Acquisition::Fallback(EnhancedError::NoQualifyingIssues { message }) => {
                assert_eq!(message, "Nothing above medium");
            }
            other => panic!("unexpected acquisition: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_extra_fetch_attempts_poll_then_fall_back() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/reports/j1/enhanced/trigger");
                then.status(200).body(r#"{"status":"processing","issues_count":2}"#);
            })
            .await;
        let enhanced = server
            .mock_async(|when, then| {
                when.method(GET).path("/reports/j1/enhanced");
                then.status(200)
                    .body(r#"{"job_id":"j1","status":"processing","enhanced_issues":[]}"#);
            })
            .await;

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 3);
        let acquisition = acquire_enhanced(&ctx, "j1").await;

        assert_eq!(enhanced.hits_async().await, 3);
        assert_eq!(acquisition.source(), ReportSource::Baseline);
        assert!(matches!(
            acquisition.fallback_reason(),
            Some(EnhancedError::InProgress)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_still_resolves() {
        let server = MockServer::start_async().await;
        let (mut ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        let client = NetClient::new(NetConfig {
            retry_count: 0,
            timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(1),
            ..NetConfig::default()
        })
        .unwrap();
        ctx.api = Arc::new(
            ScannerApi::new(client, "http://127.0.0.1:1", FetchPolicy::uncached()).unwrap(),
        );

        let acquisition = acquire_enhanced(&ctx, "j1").await;
        assert_eq!(
            acquisition.fallback_reason().map(EnhancedError::reason),
            Some(UnavailableReason::Failed)
        );
    }

    #[tokio::test]
    async fn test_unknown_format_exports_json() {
        let server = MockServer::start_async().await;
        mock_report(&server).await;

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        let format: ExportFormat = "xlsx".parse().unwrap();
        let outcome = export(&ctx, ExportRequest::new("j1", format)).await.unwrap();

        assert_eq!(outcome.artifact.format, ExportFormat::Json);
        assert_eq!(outcome.artifact.mime_type, "application/json");
        assert_eq!(outcome.artifact.filename, "security-report-j1.json");
        let value: serde_json::Value = serde_json::from_str(&outcome.artifact.content).unwrap();
        assert_eq!(value["files"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_held_report_is_not_refetched() {
        let server = MockServer::start_async().await;
        let baseline = mock_report(&server).await;
        let report = serde_json::from_str(REPORT).unwrap();

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        let outcome = export(
            &ctx,
            ExportRequest::new("j1", ExportFormat::Csv).with_report(report),
        )
        .await
        .unwrap();

        assert_eq!(baseline.hits_async().await, 0);
        assert!(!outcome.artifact.is_empty());
    }

    #[tokio::test]
    async fn test_missing_report_fails_export() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reports/gone");
                then.status(404)
                    .body(r#"{"error":{"code":"HTTP_ERROR","message":"Report not found"}}"#);
            })
            .await;

        let (ctx, mut rx) = ctx(&server, Duration::from_millis(10), 1);
        let err = export(&ctx, ExportRequest::new("gone", ExportFormat::Csv))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Network(NetworkError::Api { status: 404, .. })
        ));
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Export(ExportEvent::Failed { .. }))));
    }

    #[tokio::test]
    async fn test_export_then_write_artifact() {
        let server = MockServer::start_async().await;
        mock_report(&server).await;
        let dir = tempfile::tempdir().unwrap();

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        let outcome = export(&ctx, ExportRequest::new("j1", ExportFormat::Markdown))
            .await
            .unwrap();
        let path = write_artifact(&outcome.artifact, dir.path()).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, outcome.artifact.content);
        assert!(written.contains("| Total Issues | 3 |"));
    }

    #[tokio::test]
    async fn test_cancel_and_rerun_emit_operation_events() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/jobs/j1");
                then.status(200).body(r#"{"job_id":"j1","status":"canceled"}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jobs/j1/rerun");
                then.status(200).body(r#"{"job_id":"j2","status":"queued"}"#);
            })
            .await;

        let (ctx, mut rx) = ctx(&server, Duration::from_millis(10), 1);
        let ack = cancel(&ctx, "j1").await.unwrap();
        assert_eq!(ack.status.as_deref(), Some("canceled"));
        let ack = rerun(&ctx, "j1").await.unwrap();
        assert_eq!(ack.job_id, "j2");

        let completed: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::General(GeneralEvent::OperationCompleted { operation, .. }) => {
                    Some(operation)
                }
                _ => None,
            })
            .collect();
        assert_eq!(completed, ["cancel", "rerun"]);
    }

    #[tokio::test]
    async fn test_health_result_serializes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).body(r#"{"status":"ok","version":"1.0.0"}"#);
            })
            .await;

        let (ctx, _rx) = ctx(&server, Duration::from_millis(10), 1);
        let result = OperationResult::Health(health(&ctx).await.unwrap());
        assert!(result.is_success());
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "Health");
        assert_eq!(json["data"]["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_list_reports_failure_emits_operation_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reports").query_param("severity", "high");
                then.status(200)
                    .body(r#"{"items":[{"job_id":"j1","generated_at":"2024-05-01T10:00:00"}],"page":1,"limit":20,"total":1}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reports").query_param("page", "9");
                then.status(500).body(r#"{"detail":"Failed to list reports"}"#);
            })
            .await;

        let (ctx, mut rx) = ctx(&server, Duration::from_millis(10), 1);
        let query = ReportQuery {
            severity: Some(Severity::High),
            ..ReportQuery::default()
        };
        let list = list_reports(&ctx, &query).await.unwrap();
        assert_eq!(list.items[0].job_id, "j1");
        assert_eq!(list.items[0].summary.total(), 0);

        let result = OperationResult::Reports(list);
        assert!(result.is_success());
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "Reports");
        assert_eq!(json["data"]["total"], 1);

        let page_nine = ReportQuery {
            page: Some(9),
            ..ReportQuery::default()
        };
        let err = list_reports(&ctx, &page_nine).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::Api { status: 500, .. })
        ));
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            AppEvent::General(GeneralEvent::OperationFailed { operation, .. }) if operation == "list_reports"
        )));
    }
}
