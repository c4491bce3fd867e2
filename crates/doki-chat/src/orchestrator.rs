//! Generation orchestrator: sequences labeling, history, prompting,
//! generation, search and persistence for one request.
//!
//! Backends and the store are injected; the orchestrator itself holds no
//! mutable state, so one instance serves concurrent requests.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use doki_core::backend::{ImageLabeler, TextGenerator, WebSearcher};
use doki_core::config::{DokiConfig, EmptyCandidatePolicy};
use doki_core::types::{ConversationTurn, GenerationRequest, GenerationResult};
use doki_storage::ConversationStore;

use crate::citation::CitationFormatter;
use crate::error::ChatError;
use crate::policy::{KeywordSearchPolicy, NeverSearch, SearchPolicy};
use crate::prompt::PromptBuilder;
use crate::stage::Stage;

/// External collaborators the orchestrator drives.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn ConversationStore>,
    pub labeler: Arc<dyn ImageLabeler>,
    pub generator: Arc<dyn TextGenerator>,
    pub searcher: Arc<dyn WebSearcher>,
}

/// Central coordinator for generation requests.
pub struct Orchestrator {
    backends: Backends,
    prompt_builder: PromptBuilder,
    citations: CitationFormatter,
    search_policy: Arc<dyn SearchPolicy>,
    on_empty_candidates: EmptyCandidatePolicy,
    max_message_chars: usize,
}

impl Orchestrator {
    /// Create an orchestrator using the prompt, search and limit settings
    /// from `config`.
    pub fn new(backends: Backends, config: &DokiConfig) -> Self {
        Self {
            backends,
            prompt_builder: PromptBuilder::new(&config.persona, &config.conversation),
            citations: CitationFormatter,
            search_policy: search_policy_for(&config.persona.search_keyword),
            on_empty_candidates: config.generation.on_empty_candidates,
            max_message_chars: config.conversation.max_message_chars,
        }
    }

    /// Replace the search trigger.
    pub fn with_search_policy(mut self, policy: impl SearchPolicy + 'static) -> Self {
        self.search_policy = Arc::new(policy);
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.backends.store
    }

    /// Handle one generation request end to end.
    pub async fn handle(&self, request: GenerationRequest) -> Result<GenerationResult, ChatError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("generate", %request_id, user_id = %request.user_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: GenerationRequest) -> Result<GenerationResult, ChatError> {
        let mut stage = Stage::Start;

        if let Err(e) = self.validate(&request) {
            warn!(error = %e, "Rejected generation request");
            return Err(e);
        }
        debug!(text_len = request.text.len(), "Input text accepted");

        // Image labeling is a hard failure: nothing is loaded or persisted.
        advance(&mut stage, Stage::ImageCheck);
        let image_description = match request.image_data.as_deref() {
            Some(image) if !image.is_empty() => {
                match self.backends.labeler.label(image).await {
                    Ok(description) => {
                        info!(%description, "Image description");
                        Some(description)
                    }
                    Err(e) => {
                        error!(error = %e, "Error analyzing image");
                        advance(&mut stage, Stage::Failed);
                        return Err(ChatError::ImageLabeling(e));
                    }
                }
            }
            _ => None,
        };

        advance(&mut stage, Stage::LoadHistory);
        let history = self.backends.store.load(&request.user_id).await;
        debug!(turns = history.len(), "Conversation history loaded");

        advance(&mut stage, Stage::BuildPrompt);
        let prompt =
            self.prompt_builder
                .build(&history, &request.text, image_description.as_deref());

        advance(&mut stage, Stage::Generate);
        let completion = match self.backends.generator.complete(&prompt).await {
            Ok(completion) => completion
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            Err(e) => {
                error!(error = %e, "Error calling generation backend");
                advance(&mut stage, Stage::Failed);
                return Err(ChatError::Generation(e));
            }
        };
        // A blank completion counts as no candidate.
        let mut generated_text = match completion {
            Some(text) => text,
            None => {
                warn!("No usable choice in the generation response");
                match self.on_empty_candidates {
                    EmptyCandidatePolicy::Fail => {
                        advance(&mut stage, Stage::Failed);
                        return Err(ChatError::EmptyGeneration);
                    }
                    EmptyCandidatePolicy::Continue => String::new(),
                }
            }
        };

        advance(&mut stage, Stage::SearchCheck);
        let mut search_failure = None;
        if self.search_policy.should_search(&request.text) {
            advance(&mut stage, Stage::Search);
            info!("Performing web search");
            match self.backends.searcher.search(&generated_text).await {
                Ok(results) if results.is_empty() => {
                    warn!("No search results found");
                }
                Ok(results) => {
                    advance(&mut stage, Stage::FormatCitations);
                    debug!(count = results.len(), "Search results");
                    generated_text = self.citations.format(&generated_text, &results);
                }
                Err(e) => {
                    error!(error = %e, "Error calling web search backend");
                    search_failure = Some(e);
                }
            }
        }

        // Once generation succeeded the exchange is persisted, even if the
        // search stage failed.
        advance(&mut stage, Stage::SaveHistory);
        let new_turns = [
            ConversationTurn::user(request.text.as_str()),
            ConversationTurn::assistant(generated_text.as_str()),
        ];
        self.backends
            .store
            .append(&request.user_id, &new_turns)
            .await;

        if let Some(e) = search_failure {
            advance(&mut stage, Stage::Failed);
            return Err(ChatError::Search(e));
        }

        let mut updated_conversation_history = history;
        updated_conversation_history.extend(new_turns);

        advance(&mut stage, Stage::Respond);
        info!(
            generated_len = generated_text.len(),
            turns = updated_conversation_history.len(),
            "Generation complete"
        );

        Ok(GenerationResult {
            generated_text,
            updated_conversation_history,
        })
    }

    fn validate(&self, request: &GenerationRequest) -> Result<(), ChatError> {
        if request.user_id.trim().is_empty() {
            return Err(ChatError::MissingUserId);
        }
        if request.text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if request.text.chars().count() > self.max_message_chars {
            return Err(ChatError::MessageTooLong(self.max_message_chars));
        }
        Ok(())
    }
}

/// A blank keyword turns web search off.
fn search_policy_for(keyword: &str) -> Arc<dyn SearchPolicy> {
    if keyword.trim().is_empty() {
        Arc::new(NeverSearch)
    } else {
        Arc::new(KeywordSearchPolicy::new(keyword))
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(
        stage.can_transition_to(next),
        "invalid pipeline transition {} -> {}",
        stage,
        next
    );
    debug!(from = %stage, to = %next, "Pipeline stage");
    *stage = next;
}

// =============================================================================
// Tests
// =============================================================================
