//! Google Custom Search JSON API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use doki_core::backend::{rank_results, WebSearcher};
use doki_core::config::SearchConfig;
use doki_core::error::{DokiError, Result};
use doki_core::types::SearchResult;

/// Client for `GET {endpoint}/customsearch/v1`.
pub struct CustomSearchClient {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
}

impl CustomSearchClient {
    pub fn new(
        config: &SearchConfig,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: crate::http_client(config.timeout_secs)?,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Build from config; both the API key and the engine id come from the
    /// environment.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let key = crate::read_key(&config.api_key_env)?;
        let engine_id = crate::read_key(&config.engine_id_env)?;
        Self::new(config, key, engine_id)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

/// Ranked results from a search response. A response without `items`
/// means no hits.
pub fn parse_results(body: &str) -> Result<Vec<SearchResult>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| DokiError::WebSearch(format!("Failed to parse response: {e}")))?;
    Ok(rank_results(
        response.items.into_iter().map(|item| (item.title, item.link)),
    ))
}

#[async_trait]
impl WebSearcher for CustomSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/customsearch/v1", self.endpoint);
        debug!(query_len = query.len(), "Requesting web search");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| DokiError::WebSearch(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DokiError::WebSearch(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(DokiError::WebSearch(format!(
                "Custom Search API error ({}): {}",
                status, body
            )));
        }

        parse_results(&body)
    }
}
