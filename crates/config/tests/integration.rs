//! Integration tests for config

#[cfg(test)]
mod tests {
    use codeagent_config::*;
    use codeagent_types::ExportFormat;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 5] = [
        "CODEAGENT_API_URL",
        "CODEAGENT_EXPORT_FORMAT",
        "CODEAGENT_OUTPUT_DIR",
        "CODEAGENT_GRACE_DELAY_MS",
        "CODEAGENT_FETCH_ATTEMPTS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[api]
base_url = "https://scanner.internal:9000/"

[network]
timeout = 5
retries = 0

[enhanced]
grace_delay_ms = 250

[export]
default_format = "csv"
output_dir = "/tmp/reports"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.api_base_url(), "https://scanner.internal:9000");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.network.retries, 0);
        assert_eq!(config.network.connect_timeout, 10);
        assert_eq!(config.grace_delay(), Duration::from_millis(250));
        assert_eq!(config.enhanced.fetch_attempts, 1);
        assert_eq!(config.export.default_format, ExportFormat::Csv);
        assert_eq!(config.export.output_dir, Path::new("/tmp/reports"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url(), "http://localhost:8000");
        assert_eq!(config.grace_delay(), Duration::from_secs(2));
        assert_eq!(config.job_stale_after(), Duration::from_secs(2));
        assert!(config.network.report_cache);
        assert_eq!(config.export.default_format, ExportFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_export_format_falls_back_to_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[export]\ndefault_format = \"pdf\"").unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.export.default_format, ExportFormat::Json);
    }

    #[tokio::test]
    async fn test_invalid_base_url_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[api]\nbase_url = \"localhost:8000\"").unwrap();

        let result = Config::load_from_file(temp_file.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_fetch_attempts_rejected_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[enhanced]\nfetch_attempts = 0").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(err.to_string().contains("enhanced.fetch_attempts"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let result = Config::load_from_file(Path::new("/nonexistent/codeagent.toml")).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("CODEAGENT_API_URL", "http://10.0.0.5:8000");
        std::env::set_var("CODEAGENT_EXPORT_FORMAT", "MD");
        std::env::set_var("CODEAGENT_GRACE_DELAY_MS", "50");
        std::env::set_var("CODEAGENT_FETCH_ATTEMPTS", "3");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.api_base_url(), "http://10.0.0.5:8000");
        assert_eq!(config.export.default_format, ExportFormat::Markdown);
        assert_eq!(config.grace_delay(), Duration::from_millis(50));
        assert_eq!(config.enhanced.fetch_attempts, 3);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("CODEAGENT_FETCH_ATTEMPTS", "0");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        clear_env();
    }
}
