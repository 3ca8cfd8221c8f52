#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for codeagent
//!
//! This crate owns every conversation with the scanner backend: the
//! pooled HTTP client with retry logic, the typed endpoint surface, the
//! per-session response cache and the server-sent event decoder used for
//! live job progress.

mod api;
mod cache;
mod client;
mod sse;

pub use api::{parse_error_body, FetchPolicy, ScannerApi};
pub use cache::TtlCache;
pub use client::{NetClient, NetConfig};
pub use sse::{normalize_frame, JobEventStream, SseDecoder, SseFrame};

use codeagent_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")).into())
}
