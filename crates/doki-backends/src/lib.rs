//! HTTP adapters for the external services DokiAI depends on.
//!
//! Each adapter implements one of the backend traits from `doki-core` and
//! reads its API key from the environment variable named in configuration.

pub mod completions;
pub mod search;
pub mod unconfigured;
pub mod vision;

use std::time::Duration;

use doki_core::error::{DokiError, Result};

pub use completions::CompletionsClient;
pub use search::CustomSearchClient;
pub use unconfigured::Unconfigured;
pub use vision::VisionLabeler;

/// Read a non-empty secret from the environment variable `var`.
pub fn read_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DokiError::NotConfigured(format!(
            "environment variable {} is not set",
            var
        ))),
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("doki/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DokiError::Config(format!("HTTP client error: {e}")))
}
