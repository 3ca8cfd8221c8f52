use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::FailureContext;

/// Events that belong to no single job stream or export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneralEvent {
    Warning {
        message: String,
        /// Usually the job the warning is about
        context: Option<String>,
    },

    Error {
        message: String,
        details: Option<String>,
    },

    /// Shown only under `--debug`
    DebugLog {
        message: String,
        context: BTreeMap<String, String>,
    },

    /// A backend call such as `cancel` or `health` was issued
    OperationStarted {
        operation: String,
    },

    OperationCompleted {
        operation: String,
        success: bool,
    },

    OperationFailed {
        operation: String,
        failure: FailureContext,
    },
}

impl GeneralEvent {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: None,
        }
    }

    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            details: None,
        }
    }

    /// Debug line carrying key/value pairs, e.g. the fetch attempt number
    pub fn debug_with_context<K, V>(
        message: impl Into<String>,
        context: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::DebugLog {
            message: message.into(),
            context: context
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
