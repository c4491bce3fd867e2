//! Error types for the generation pipeline.

use doki_core::error::DokiError;

use crate::stage::Stage;

/// Errors from handling a generation request.
///
/// Validation variants are the caller's fault. Everything else is a hard
/// failure of a backend stage and is reported to clients as a single opaque
/// internal error.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("user id is required")]
    MissingUserId,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("image labeling failed: {0}")]
    ImageLabeling(#[source] DokiError),
    #[error("text generation failed: {0}")]
    Generation(#[source] DokiError),
    #[error("text generation returned no candidates")]
    EmptyGeneration,
    #[error("web search failed: {0}")]
    Search(#[source] DokiError),
}

impl ChatError {
    /// Stage at which the request failed.
    pub fn stage(&self) -> Stage {
        match self {
            ChatError::MissingUserId | ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                Stage::Start
            }
            ChatError::ImageLabeling(_) => Stage::ImageCheck,
            ChatError::Generation(_) | ChatError::EmptyGeneration => Stage::Generate,
            ChatError::Search(_) => Stage::Search,
        }
    }

    /// Whether clients should see this as an internal error rather than a
    /// rejected request.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            ChatError::MissingUserId | ChatError::EmptyMessage | ChatError::MessageTooLong(_)
        )
    }
}
