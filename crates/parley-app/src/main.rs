//! Parley gateway binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Load the FAQ corpus into the in-memory search index
//! 3. Build guard rails, retrieval, and the generation client
//! 4. Spawn the inactivity sweep
//! 5. Serve the axum HTTP + WebSocket gateway

use std::path::PathBuf;
use std::sync::Arc;

use parley_api::{routes, AppState, ConnectionRegistry, InactivityMonitor};
use parley_chat::{AnswerComposer, OllamaClient, SessionOrchestrator, SessionStore};
use parley_core::ParleyConfig;
use parley_guard::{ContentFilter, GuardRailPipeline, InputValidator, RateLimiter, TopicScopeGuard};
use parley_retrieval::{InMemoryOfferStore, MemoryIndex, RetrievalAdapter};

/// Resolve the config file path (`PARLEY_CONFIG` env, or ./parley.toml).
fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("PARLEY_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("parley.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = config_path();
    let config = ParleyConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Knowledge base. An empty index is not fatal: every question then
    // takes the human-handoff path.
    let corpus_path = PathBuf::from(&config.retrieval.corpus_file);
    let index = match MemoryIndex::from_file(&corpus_path) {
        Ok(index) => {
            tracing::info!(path = %corpus_path.display(), entries = index.len(), "Knowledge base loaded");
            index
        }
        Err(e) => {
            tracing::warn!(path = %corpus_path.display(), error = %e, "Knowledge base unavailable; all questions will be handed off");
            MemoryIndex::new()
        }
    };

    // Guard rails.
    let guard = GuardRailPipeline::new(
        InputValidator::new(&config.guard),
        Arc::new(ContentFilter::new()),
        RateLimiter::from_config(&config.guard),
        Arc::new(TopicScopeGuard::new(config.guard.out_of_scope_topics.clone())),
    );

    // Retrieval + generation.
    let retrieval = RetrievalAdapter::new(Arc::new(index), config.retrieval.clone());
    let generation = OllamaClient::new(
        config.generation.base_url.clone(),
        config.generation.model.clone(),
    );
    let composer = AnswerComposer::new(Arc::new(generation), Arc::new(ContentFilter::new()));

    // Orchestrator over process-lifetime session state.
    let orchestrator = SessionOrchestrator::new(
        guard,
        retrieval,
        composer,
        Arc::new(SessionStore::new(config.chat.context_pairs)),
        Arc::new(InMemoryOfferStore::with_fixtures()),
    );

    // Connection registry + background idle sweep.
    let registry = Arc::new(ConnectionRegistry::new());
    let monitor = InactivityMonitor::new(Arc::clone(&registry), &config.liveness);
    tokio::spawn(monitor.run());

    // Serve.
    let state = AppState::new(config.clone(), orchestrator, registry);
    routes::start_server(&config, state).await?;

    Ok(())
}
