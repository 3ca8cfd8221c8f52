//! Integration tests for the codeagent CLI

use std::process::{Command, Output};

use httpmock::prelude::*;

const REPORT: &str = r#"{
    "job_id": "job-7",
    "meta": {"tools": ["semgrep"]},
    "summary": {"critical": 0, "high": 1, "medium": 0, "low": 0},
    "files": [
        {"path": "app.py", "issues": [
            {"tool": "semgrep", "type": "sast", "rule_id": "eval-use", "severity": "high",
             "file": "app.py", "line": 3, "message": "eval on user input"}
        ]}
    ]
}"#;

/// Run the binary isolated from the user's config and environment
fn codeagent(args: &[&str]) -> Output {
    let home = tempfile::tempdir().expect("temp home");
    Command::new(env!("CARGO_BIN_EXE_codeagent"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("XDG_DATA_HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("CODEAGENT_API_URL")
        .env_remove("CODEAGENT_EXPORT_FORMAT")
        .env_remove("CODEAGENT_OUTPUT_DIR")
        .env_remove("CODEAGENT_GRACE_DELAY_MS")
        .env_remove("CODEAGENT_FETCH_ATTEMPTS")
        .output()
        .expect("Failed to execute codeagent")
}

#[test]
fn test_cli_version() {
    let output = codeagent(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("codeagent"));
}

#[test]
fn test_cli_help() {
    let output = codeagent(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("export"));
    assert!(stdout.contains("watch"));
    assert!(stdout.contains("health"));
    assert!(stdout.contains("reports"));
}

#[test]
fn test_cli_invalid_command() {
    let output = codeagent(&["invalid-command"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_api_url_is_a_config_error() {
    let output = codeagent(&["--api-url", "ftp://scanner", "health"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
}

#[test]
fn test_health_against_scanner() {
    let server = MockServer::start();
    let health = server.mock(|when, then| {
        when.method(GET).path("/health");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"ok","version":"1.4.0"}"#);
    });

    let output = codeagent(&["--api-url", &server.base_url(), "health"]);

    health.assert();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok"));
    assert!(stdout.contains("1.4.0"));
}

#[test]
fn test_missing_report_reports_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reports/job-404/summary");
        then.status(404)
            .header("content-type", "application/json")
            .body(r#"{"detail":"Report not found"}"#);
    });

    let output = codeagent(&["--api-url", &server.base_url(), "summary", "job-404"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Code:"));
}

#[test]
fn test_export_to_stdout() {
    let server = MockServer::start();
    let report = server.mock(|when, then| {
        when.method(GET).path("/reports/job-7");
        then.status(200)
            .header("content-type", "application/json")
            .body(REPORT);
    });

    let output = codeagent(&[
        "--api-url",
        &server.base_url(),
        "export",
        "job-7",
        "--format",
        "csv",
        "--stdout",
    ]);

    report.assert();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() >= 2);
    assert!(stdout.contains("eval on user input"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("standard report"));
}

#[test]
fn test_export_writes_file_and_json_summary() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reports/job-7");
        then.status(200)
            .header("content-type", "application/json")
            .body(REPORT);
    });
    let out_dir = tempfile::tempdir().unwrap();

    let output = codeagent(&[
        "--json",
        "--api-url",
        &server.base_url(),
        "export",
        "job-7",
        "--format",
        "markdown",
        "--output-dir",
        out_dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["type"], "Export");
    assert_eq!(summary["data"]["format"], "markdown");
    assert!(summary["data"]["fallback"].is_null());

    let filename = summary["data"]["filename"].as_str().unwrap();
    assert!(filename.ends_with(".md"));
    let written = std::fs::read_to_string(out_dir.path().join(filename)).unwrap();
    assert!(written.contains("eval on user input"));
}

#[test]
fn test_reports_lists_job_ids() {
    let server = MockServer::start();
    let reports = server.mock(|when, then| {
        when.method(GET)
            .path("/reports")
            .query_param("severity", "critical")
            .query_param("limit", "5");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"items":[
                    {"job_id":"job-7","repo_url":"https://github.com/o/r",
                     "generated_at":"2024-05-01T10:00:00",
                     "summary":{"critical":1,"high":1,"medium":0,"low":0},
                     "tools":["semgrep"],"labels":[]}
                ],"page":1,"limit":5,"total":1}"#,
            );
    });

    let output = codeagent(&[
        "--api-url",
        &server.base_url(),
        "reports",
        "--severity",
        "critical",
        "--limit",
        "5",
    ]);

    reports.assert();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("job-7"));
    assert!(stdout.contains("https://github.com/o/r"));
    assert!(stdout.contains("Page 1 of 1 (1 reports)"));
}
