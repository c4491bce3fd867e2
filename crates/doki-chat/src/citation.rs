//! Citation block rendering.

use doki_core::types::SearchResult;

const CITATIONS_HEADING: &str = "Citations:";

/// Appends a numbered citation block to generated text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationFormatter;

impl CitationFormatter {
    /// Returns `text` unchanged when `results` is empty; otherwise appends a
    /// blank line, the heading, and one `[rank] title - link` line per result
    /// in rank order.
    pub fn format(&self, text: &str, results: &[SearchResult]) -> String {
        if results.is_empty() {
            return text.to_string();
        }

        let mut ranked: Vec<&SearchResult> = results.iter().collect();
        ranked.sort_by_key(|r| r.rank);

        let lines = ranked
            .iter()
            .map(|r| format!("[{}] {} - {}", r.rank, r.title, r.link))
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n\n{}\n{}", text, CITATIONS_HEADING, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rank: usize, title: &str, link: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            link: link.to_string(),
            rank,
        }
    }

    #[test]
    fn test_no_results_returns_text_unchanged() {
        let formatter = CitationFormatter;
        assert_eq!(formatter.format("Cats are mammals", &[]), "Cats are mammals");
        assert_eq!(formatter.format("", &[]), "");
    }

    #[test]
    fn test_single_result() {
        let out = CitationFormatter.format(
            "Cats are mammals",
            &[result(1, "Cat - Wikipedia", "https://en.wikipedia.org/wiki/Cat")],
        );
        assert_eq!(
            out,
            "Cats are mammals\n\nCitations:\n[1] Cat - Wikipedia - https://en.wikipedia.org/wiki/Cat"
        );
    }

    #[test]
    fn test_multiple_results_in_rank_order() {
        let out = CitationFormatter.format(
            "Answer",
            &[
                result(2, "Second", "https://two.example"),
                result(1, "First", "https://one.example"),
                result(3, "Third", "https://three.example"),
            ],
        );
        assert_eq!(
            out,
            "Answer\n\nCitations:\n\
             [1] First - https://one.example\n\
             [2] Second - https://two.example\n\
             [3] Third - https://three.example"
        );
    }
}
