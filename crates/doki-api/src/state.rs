//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use doki_chat::Orchestrator;
use doki_core::config::DokiConfig;
use doki_storage::ConversationStore;

/// Shared application state. Cloned into every handler task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DokiConfig>,
    pub orchestrator: Arc<Orchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: DokiConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }

    /// The conversation store the orchestrator persists to.
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        self.orchestrator.store()
    }
}
