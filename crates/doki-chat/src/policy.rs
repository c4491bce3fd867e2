//! Decides whether a request should be enriched with web search results.

/// Keyword that triggers a search when none is configured.
pub const DEFAULT_SEARCH_KEYWORD: &str = "search";

/// Search decision for a request, based on the user's raw message.
pub trait SearchPolicy: Send + Sync {
    fn should_search(&self, user_text: &str) -> bool;
}

/// Searches when the raw message contains a keyword (case-sensitive
/// substring match, so "research" also triggers).
#[derive(Debug, Clone)]
pub struct KeywordSearchPolicy {
    keyword: String,
}

impl KeywordSearchPolicy {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl Default for KeywordSearchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_KEYWORD)
    }
}

impl SearchPolicy for KeywordSearchPolicy {
    fn should_search(&self, user_text: &str) -> bool {
        !self.keyword.is_empty() && user_text.contains(&self.keyword)
    }
}

/// Never searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSearch;

impl SearchPolicy for NeverSearch {
    fn should_search(&self, _user_text: &str) -> bool {
        false
    }
}
