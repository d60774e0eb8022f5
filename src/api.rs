//! HTTP API for the block editor
//!
//! Snapshot reads, streaming and one-shot conversation turns, change-set
//! review, and apply.

mod handlers;
mod stream;
mod types;

pub use handlers::create_router;

use crate::llm::ProviderRegistry;
use crate::store::ContentStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub providers: Arc<ProviderRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, providers: Arc<ProviderRegistry>) -> Self {
        Self { store, providers }
    }
}
