//! Blockwright - LLM-assisted editing of structured content blocks
//!
//! Streams provider replies to the editor in a uniform line protocol, splits
//! proposed field edits out of the reply, renders them as a reviewable diff,
//! and merges approved edits into the content store.

mod api;
mod content;
mod diff;
mod extract;
mod llm;
mod patch;
mod prompt;
mod relay;
mod store;

use api::{create_router, AppState};
use llm::{LlmConfig, ProviderRegistry};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use store::{ContentStore, MemoryStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Listener and content-store settings
#[derive(Debug, Clone)]
struct ServerConfig {
    port: u16,
    content_path: Option<PathBuf>,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            port: std::env::var("BLOCKWRIGHT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            content_path: std::env::var("BLOCKWRIGHT_CONTENT_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blockwright=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env();

    // Content store
    let store = match &config.content_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading content");
            MemoryStore::load(path).await?
        }
        None => MemoryStore::new(),
    };
    tracing::info!(posts = store.post_count().await, "Content store ready");
    let store: Arc<dyn ContentStore> = Arc::new(store);

    // LLM provider
    let llm_config = LlmConfig::from_env();
    let providers = Arc::new(ProviderRegistry::new(&llm_config));

    // Create application state
    let state = AppState::new(store, providers);

    // Create router (streamed frames must not be buffered: no compression layer)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Blockwright server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
