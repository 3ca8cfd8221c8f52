use codeagent_errors::{Error, ExportError};
use serde::Serialize;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ExportError::Encode {
            format: "json".to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
