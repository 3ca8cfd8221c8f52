//! Operations context for dependency injection

use std::sync::Arc;

use codeagent_config::Config;
use codeagent_errors::{Error, OpsError};
use codeagent_events::{EventEmitter, EventSender};
use codeagent_net::ScannerApi;

/// Operations context providing access to the scanner client
pub struct OpsCtx {
    /// Scanner API client, shared with live job subscriptions
    pub api: Arc<ScannerApi>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Client configuration
    pub config: Config,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for [`OpsCtx`]
pub struct OpsContextBuilder {
    api: Option<Arc<ScannerApi>>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            api: None,
            tx: None,
            config: None,
        }
    }

    /// Use an already configured API client instead of building one from
    /// the configuration.
    #[must_use]
    pub fn with_api(mut self, api: Arc<ScannerApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the event sender or configuration is missing, or
    /// if the API client cannot be built from the configuration.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.ok_or_else(|| OpsError::MissingComponent {
            component: "config".to_string(),
        })?;

        let api = match self.api {
            Some(api) => api,
            None => Arc::new(ScannerApi::from_config(&config)?),
        };

        Ok(OpsCtx { api, tx, config })
    }
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
