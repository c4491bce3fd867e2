//! Request orchestration for DokiAI.
//!
//! Turns a user message (and optional image) into a completion prompt,
//! calls the generation backend, optionally enriches the answer with web
//! search citations, and persists the exchange.

pub mod citation;
pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod stage;

pub use citation::CitationFormatter;
pub use error::ChatError;
pub use orchestrator::{Backends, Orchestrator};
pub use policy::{KeywordSearchPolicy, NeverSearch, SearchPolicy};
pub use prompt::PromptBuilder;
pub use stage::Stage;
