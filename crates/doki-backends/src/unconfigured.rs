//! Stand-in for a backend whose credentials are missing.

use async_trait::async_trait;

use doki_core::backend::{ImageLabeler, TextGenerator, WebSearcher};
use doki_core::error::{DokiError, Result};
use doki_core::types::SearchResult;

/// Fails every call with [`DokiError::NotConfigured`], so the service can
/// start and report the missing backend per request.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    backend: &'static str,
}

impl Unconfigured {
    pub fn new(backend: &'static str) -> Self {
        Self { backend }
    }

    fn error(&self) -> DokiError {
        DokiError::NotConfigured(self.backend.to_string())
    }
}

#[async_trait]
impl ImageLabeler for Unconfigured {
    async fn label(&self, _image: &[u8]) -> Result<String> {
        Err(self.error())
    }
}

#[async_trait]
impl WebSearcher for Unconfigured {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
        Err(self.error())
    }
}

#[async_trait]
impl TextGenerator for Unconfigured {
    async fn complete(&self, _prompt: &str) -> Result<Option<String>> {
        Err(self.error())
    }
}
