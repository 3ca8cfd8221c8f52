#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for codeagent
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/codeagent/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use codeagent_errors::{ConfigError, Error};
use codeagent_types::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub enhanced: EnhancedConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Scanner backend location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Job snapshots younger than this are served from cache.
    #[serde(default = "default_job_stale_after_ms")]
    pub job_stale_after_ms: u64,
    /// Completed reports never change, so they may be cached for the session.
    #[serde(default = "default_report_cache")]
    pub report_cache: bool,
}

/// Enhanced report acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedConfig {
    /// Wait between a "processing" trigger and the fetch.
    #[serde(default = "default_grace_delay_ms")]
    pub grace_delay_ms: u64,
    /// Fetch attempts after the grace delay; 1 keeps acquisition single-shot.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,
}

/// Export defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub default_format: ExportFormat,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

// Default implementations

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            job_stale_after_ms: default_job_stale_after_ms(),
            report_cache: default_report_cache(),
        }
    }
}

impl Default for EnhancedConfig {
    fn default() -> Self {
        Self {
            grace_delay_ms: default_grace_delay_ms(),
            fetch_attempts: default_fetch_attempts(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: ExportFormat::Json,
            output_dir: default_output_dir(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_job_stale_after_ms() -> u64 {
    2000
}

fn default_report_cache() -> bool {
    true
}

fn default_grace_delay_ms() -> u64 {
    2000
}

fn default_fetch_attempts() -> u32 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("codeagent").join("config.toml"))
    }

    /// Directory for debug log files
    ///
    /// # Errors
    ///
    /// Returns an error if no local data directory can be determined.
    pub fn log_dir() -> Result<PathBuf, Error> {
        let data_dir = dirs::data_local_dir().ok_or_else(|| ConfigError::NotFound {
            path: "local data directory".to_string(),
        })?;
        Ok(data_dir.join("codeagent").join("logs"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or holds values that fail validation.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // CODEAGENT_API_URL
        if let Ok(url) = std::env::var("CODEAGENT_API_URL") {
            if !is_http_url(&url) {
                return Err(ConfigError::InvalidValue {
                    field: "CODEAGENT_API_URL".to_string(),
                    value: url,
                }
                .into());
            }
            self.api.base_url = url;
        }

        // CODEAGENT_EXPORT_FORMAT
        if let Ok(format) = std::env::var("CODEAGENT_EXPORT_FORMAT") {
            self.export.default_format = ExportFormat::parse_lenient(&format);
        }

        // CODEAGENT_OUTPUT_DIR
        if let Ok(dir) = std::env::var("CODEAGENT_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(dir);
        }

        // CODEAGENT_GRACE_DELAY_MS
        if let Ok(delay) = std::env::var("CODEAGENT_GRACE_DELAY_MS") {
            self.enhanced.grace_delay_ms =
                delay.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "CODEAGENT_GRACE_DELAY_MS".to_string(),
                    value: delay,
                })?;
        }

        // CODEAGENT_FETCH_ATTEMPTS
        if let Ok(attempts) = std::env::var("CODEAGENT_FETCH_ATTEMPTS") {
            self.enhanced.fetch_attempts = match attempts.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "CODEAGENT_FETCH_ATTEMPTS".to_string(),
                        value: attempts,
                    }
                    .into())
                }
            };
        }

        Ok(())
    }

    /// Check values serde cannot constrain.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if !is_http_url(&self.api.base_url) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                value: self.api.base_url.clone(),
            }
            .into());
        }
        if self.enhanced.fetch_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enhanced.fetch_attempts".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.network.connect_timeout)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.network.retry_delay_ms)
    }

    #[must_use]
    pub fn job_stale_after(&self) -> Duration {
        Duration::from_millis(self.network.job_stale_after_ms)
    }

    #[must_use]
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.enhanced.grace_delay_ms)
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty())
}
