//! HTTP client with connection pooling and retry logic

use codeagent_config::Config;
use codeagent_errors::{Error, NetworkError, StreamError};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            retry_count: 2,
            retry_delay: Duration::from_millis(500),
            user_agent: format!("codeagent/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetConfig {
    /// Network settings from the loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            retry_count: config.network.retries,
            retry_delay: config.retry_delay(),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    // Event streams stay open for the job's lifetime, so this client has
    // no overall request timeout.
    stream_client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest clients fail to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;

        let stream_client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            stream_client,
            config,
        })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Execute a GET request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(url, || self.client.get(url)).await
    }

    /// Execute a DELETE request without retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn delete(&self, url: &str) -> Result<Response, Error> {
        self.send_once(url, self.client.delete(url)).await
    }

    /// Execute a POST request with an empty body, without retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn post(&self, url: &str) -> Result<Response, Error> {
        self.send_once(url, self.client.post(url)).await
    }

    /// Open a long-lived `text/event-stream` response.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Connect` when the connection cannot be made and
    /// `StreamError::HttpStatus` when the server refuses the stream.
    pub async fn open_event_stream(&self, url: &str) -> Result<Response, StreamError> {
        let response = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| StreamError::Connect {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StreamError::HttpStatus {
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    async fn send_once(&self, url: &str, request: RequestBuilder) -> Result<Response, Error> {
        let response = request
            .send()
            .await
            .map_err(|e| Self::convert_error(url, &e))?;
        Self::check_rate_limit(response)
    }

    /// Execute a request with retries
    async fn retry_request<F>(&self, url: &str, mut build: F) -> Result<Response, Error>
    where
        F: FnMut() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
                tracing::debug!(url, attempt, "retrying request");
            }

            match build().send().await {
                Ok(response) => return Self::check_rate_limit(response),
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    last_error = Some(e);

                    // Don't retry on certain errors
                    if !retry {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(Self::convert_error(url, &e)),
            None => Err(NetworkError::RequestFailed("Unknown error".to_string()).into()),
        }
    }

    fn check_rate_limit(response: Response) -> Result<Response, Error> {
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            if let Some(retry_after) = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
            {
                return Err(NetworkError::RateLimited {
                    seconds: retry_after,
                }
                .into());
            }
        }
        Ok(response)
    }

    fn convert_error(url: &str, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()
        } else if e.is_connect() {
            NetworkError::ConnectionRefused(e.to_string()).into()
        } else {
            NetworkError::RequestFailed(e.to_string()).into()
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }
}
