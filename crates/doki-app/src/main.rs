//! `doki` binary: composition root.
//!
//! 1. Resolve configuration (CLI > env > file > defaults)
//! 2. Open the conversation store
//! 3. Build backend clients from environment credentials
//! 4. Assemble the orchestrator and serve the HTTP API

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use doki_api::{start_server, AppState};
use doki_backends::{CompletionsClient, CustomSearchClient, Unconfigured, VisionLabeler};
use doki_chat::{Backends, Orchestrator};
use doki_core::backend::{ImageLabeler, TextGenerator, WebSearcher};
use doki_core::config::{DokiConfig, StorageBackend};
use doki_core::error::Result;
use doki_storage::{
    ConversationStore, Database, MemoryConversationStore, SqliteConversationStore,
};

use cli::CliArgs;

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn open_store(config: &DokiConfig, data_dir: &Path) -> Result<Arc<dyn ConversationStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory conversation store; history is lost on restart");
            Ok(Arc::new(MemoryConversationStore::new()))
        }
        StorageBackend::Sqlite => {
            let db_path = data_dir.join(&config.storage.database_file);
            let db = Database::new(&db_path)?;
            let store = SqliteConversationStore::new(Arc::new(db));
            let conversations = store.repository().count()?;
            info!(path = %db_path.display(), conversations, "SQLite database opened");
            Ok(Arc::new(store))
        }
    }
}

fn build_backends(config: &DokiConfig, store: Arc<dyn ConversationStore>) -> Backends {
    let generator: Arc<dyn TextGenerator> = match CompletionsClient::from_config(&config.generation)
    {
        Ok(client) => {
            info!(model = %config.generation.model, "Text generation backend ready");
            Arc::new(client)
        }
        Err(e) => {
            warn!(error = %e, "Text generation backend unavailable");
            Arc::new(Unconfigured::new("text generation"))
        }
    };

    let labeler: Arc<dyn ImageLabeler> = match VisionLabeler::from_config(&config.vision) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "Image labeling backend unavailable");
            Arc::new(Unconfigured::new("image labeling"))
        }
    };

    let searcher: Arc<dyn WebSearcher> = match CustomSearchClient::from_config(&config.search) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "Web search backend unavailable");
            Arc::new(Unconfigured::new("web search"))
        }
    };

    Backends {
        store,
        labeler,
        generator,
        searcher,
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    if args.init_config {
        DokiConfig::default().save(&config_file)?;
        println!("Wrote default configuration to {}", config_file.display());
        return Ok(());
    }

    let mut config = DokiConfig::load_or_default(&config_file);
    init_tracing(&args.resolve_log_level(&config.general.log_level));
    info!("Starting DokiAI v{}", env!("CARGO_PKG_VERSION"));
    info!(path = %config_file.display(), "Configuration loaded");

    config.general.port = args.resolve_port(config.general.port);
    if let Some(ref host) = args.host {
        config.general.host = host.clone();
    }

    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let store = open_store(&config, &data_dir)?;
    let backends = build_backends(&config, store);
    let orchestrator = Orchestrator::new(backends, &config);

    let state = AppState::new(config, orchestrator);
    start_server(state).await?;

    info!("DokiAI stopped");
    Ok(())
}
