//! Interfaces to the external services the orchestrator consumes.
//!
//! Concrete HTTP adapters live in `doki-backends`; tests substitute
//! in-process fakes. Every method either returns or fails; there are no
//! retries at this layer.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SearchResult;

/// Turns raw image bytes into a descriptive label string.
#[async_trait]
pub trait ImageLabeler: Send + Sync {
    /// Label the image, returning the detected descriptions joined by `", "`
    /// in backend order.
    async fn label(&self, image: &[u8]) -> Result<String>;
}

/// Runs a web search and returns ranked hits.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search for `query`. An empty backend result set is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Language-model completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`. `Ok(None)` means the backend answered with zero
    /// candidates.
    async fn complete(&self, prompt: &str) -> Result<Option<String>>;
}

/// Join label descriptions the way every labeler reports them.
pub fn join_labels<I, S>(labels: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|l| l.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Assign 1-based ranks in the order the backend returned the items.
pub fn rank_results<I>(items: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = (String, String)>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, (title, link))| SearchResult {
            title,
            link,
            rank: index + 1,
        })
        .collect()
}
