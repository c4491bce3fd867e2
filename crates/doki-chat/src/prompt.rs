//! Prompt composition.
//!
//! Output layout:
//!
//! ```text
//! <preamble>
//!
//! User: <earlier user turn>
//! <Assistant>: <earlier assistant turn>
//! User: "<current text>"
//! User provided an image with the following objects: <labels>
//! <Assistant>:
//! ```
//!
//! The image line appears only when a non-empty description is supplied.

use doki_core::config::{ConversationConfig, PersonaConfig};
use doki_core::types::ConversationTurn;

/// Builds completion prompts from history and the current message.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona_name: String,
    assistant_label: String,
    knowledge_cutoff: String,
    search_keyword: String,
    /// Most recent turns rendered; older turns are left out of the prompt.
    max_history_turns: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(&PersonaConfig::default(), &ConversationConfig::default())
    }
}

impl PromptBuilder {
    pub fn new(persona: &PersonaConfig, conversation: &ConversationConfig) -> Self {
        Self {
            persona_name: persona.name.clone(),
            assistant_label: persona.assistant_label.clone(),
            knowledge_cutoff: persona.knowledge_cutoff.clone(),
            search_keyword: persona.search_keyword.clone(),
            max_history_turns: conversation.max_history_turns,
        }
    }

    pub fn with_max_history_turns(mut self, max_history_turns: usize) -> Self {
        self.max_history_turns = max_history_turns;
        self
    }

    /// The trailing cue every prompt ends with.
    pub fn assistant_cue(&self) -> String {
        format!("{}:", self.assistant_label)
    }

    /// Compose the prompt. Deterministic for identical inputs.
    pub fn build(
        &self,
        history: &[ConversationTurn],
        user_text: &str,
        image_description: Option<&str>,
    ) -> String {
        let mut prompt = self.preamble();
        prompt.push('\n');

        let skip = history.len().saturating_sub(self.max_history_turns);
        for turn in &history[skip..] {
            let label = if turn.is_user {
                "User"
            } else {
                self.assistant_label.as_str()
            };
            prompt.push_str(label);
            prompt.push_str(": ");
            prompt.push_str(&turn.text);
            prompt.push('\n');
        }

        prompt.push_str(&format!("User: \"{}\"\n", user_text));

        if let Some(description) = image_description.filter(|d| !d.trim().is_empty()) {
            prompt.push_str(&format!(
                "User provided an image with the following objects: {}\n",
                description
            ));
        }

        prompt.push_str(&self.assistant_cue());
        prompt
    }

    fn preamble(&self) -> String {
        format!(
            "{}, an AI language model, assists users with their questions. \
             Knowledge cutoff: {}.\n\
             For web search, include \"{}\" in the message.\n",
            self.persona_name, self.knowledge_cutoff, self.search_keyword
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(pairs: usize) -> Vec<ConversationTurn> {
        (0..pairs)
            .flat_map(|i| {
                [
                    ConversationTurn::user(format!("question {}", i)),
                    ConversationTurn::assistant(format!("answer {}", i)),
                ]
            })
            .collect()
    }

    #[test]
    fn test_empty_history_layout() {
        let prompt = PromptBuilder::default().build(&[], "Hello", None);
        assert_eq!(
            prompt,
            "DokiAI, an AI language model, assists users with their questions. \
             Knowledge cutoff: September 2021.\n\
             For web search, include \"search\" in the message.\n\
             \n\
             User: \"Hello\"\n\
             Assistant:"
        );
    }

    #[test]
    fn test_ends_with_cue_and_quotes_user_text() {
        let builder = PromptBuilder::default();
        for text in ["Hello", "search for cats", "", "multi\nline"] {
            let prompt = builder.build(&history(2), text, None);
            assert!(prompt.ends_with("Assistant:"));
            assert!(prompt.contains(&format!("User: \"{}\"", text)));
        }
    }

    #[test]
    fn test_history_rendered_in_order_with_labels() {
        let prompt = PromptBuilder::default().build(&history(2), "next", None);
        let q0 = prompt.find("User: question 0").unwrap();
        let a0 = prompt.find("Assistant: answer 0").unwrap();
        let q1 = prompt.find("User: question 1").unwrap();
        let a1 = prompt.find("Assistant: answer 1").unwrap();
        let current = prompt.find("User: \"next\"").unwrap();
        assert!(q0 < a0 && a0 < q1 && q1 < a1 && a1 < current);
    }

    #[test]
    fn test_image_line_included_when_present() {
        let prompt = PromptBuilder::default().build(&[], "what is this?", Some("Cat, Whiskers"));
        assert!(prompt.ends_with(
            "User: \"what is this?\"\n\
             User provided an image with the following objects: Cat, Whiskers\n\
             Assistant:"
        ));
    }

    #[test]
    fn test_empty_image_description_omitted() {
        let builder = PromptBuilder::default();
        let with_empty = builder.build(&[], "hi", Some(""));
        let without = builder.build(&[], "hi", None);
        assert_eq!(with_empty, without);
        assert!(!with_empty.contains("provided an image"));
    }

    #[test]
    fn test_history_window_keeps_most_recent_turns() {
        let builder = PromptBuilder::default().with_max_history_turns(2);
        let prompt = builder.build(&history(3), "next", None);
        assert!(!prompt.contains("question 0"));
        assert!(!prompt.contains("question 1"));
        assert!(prompt.contains("User: question 2"));
        assert!(prompt.contains("Assistant: answer 2"));
    }

    #[test]
    fn test_zero_window_renders_no_history() {
        let builder = PromptBuilder::default().with_max_history_turns(0);
        let prompt = builder.build(&history(3), "next", None);
        assert!(!prompt.contains("question"));
        assert!(prompt.contains("User: \"next\""));
    }

    #[test]
    fn test_custom_persona() {
        let persona = PersonaConfig {
            name: "Doki".to_string(),
            assistant_label: "Doki".to_string(),
            knowledge_cutoff: "June 2024".to_string(),
            search_keyword: "lookup".to_string(),
        };
        let builder = PromptBuilder::new(&persona, &ConversationConfig::default());
        let prompt = builder.build(&[ConversationTurn::assistant("earlier")], "hey", None);
        assert!(prompt.starts_with("Doki, an AI language model"));
        assert!(prompt.contains("Knowledge cutoff: June 2024."));
        assert!(prompt.contains("include \"lookup\""));
        assert!(prompt.contains("Doki: earlier\n"));
        assert!(prompt.ends_with("Doki:"));
    }

    #[test]
    fn test_deterministic() {
        let builder = PromptBuilder::default();
        let h = history(4);
        assert_eq!(
            builder.build(&h, "same", Some("Dog")),
            builder.build(&h, "same", Some("Dog"))
        );
    }
}
