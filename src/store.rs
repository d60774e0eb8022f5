//! Content store: where block snapshots come from and approved edits go
//!
//! The real host store lives outside this service; `MemoryStore` is the
//! process-local stand-in, optionally seeded from a JSON file of the form
//! `{"<postId>": [{"acf_fc_layout": "...", "<field>": ...}, ...]}`.

use crate::content::{ChangeSet, FieldSnapshot};
use crate::patch::apply_change_set;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Post not found: {0}")]
    PostNotFound(u64),
    #[error("Block not found: {index}")]
    BlockNotFound { post_id: u64, index: usize },
    #[error("No modules found on post {0}")]
    NoBlocks(u64),
    #[error("Failed to read content file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid content file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of committing a change-set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub updated_count: usize,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fresh snapshot of one block, all fields included
    async fn fetch_block(&self, post_id: u64, index: usize) -> StoreResult<FieldSnapshot>;

    /// Fresh snapshots of every block on a post, in page order
    async fn fetch_page(&self, post_id: u64) -> StoreResult<Vec<FieldSnapshot>>;

    /// Commit an approved change-set
    async fn apply(&self, post_id: u64, changes: &ChangeSet) -> StoreResult<ApplyOutcome>;
}

/// In-process store; concurrent applies are serialized, last writer wins
#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<HashMap<u64, Vec<FieldSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the seed format
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let raw: HashMap<u64, Vec<Map<String, Value>>> = serde_json::from_str(json)?;
        let posts = raw
            .into_iter()
            .map(|(post_id, blocks)| {
                let snapshots = blocks
                    .into_iter()
                    .enumerate()
                    .map(|(index, block)| FieldSnapshot::from_raw(index, block))
                    .collect();
                (post_id, snapshots)
            })
            .collect();
        Ok(Self {
            posts: RwLock::new(posts),
        })
    }

    /// Load a seed file from disk
    pub async fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Number of posts held
    pub async fn post_count(&self) -> usize {
        self.posts.read().await.len()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_block(&self, post_id: u64, index: usize) -> StoreResult<FieldSnapshot> {
        let posts = self.posts.read().await;
        let blocks = posts.get(&post_id).ok_or(StoreError::PostNotFound(post_id))?;
        blocks
            .iter()
            .find(|b| b.block_index == index)
            .cloned()
            .ok_or(StoreError::BlockNotFound { post_id, index })
    }

    async fn fetch_page(&self, post_id: u64) -> StoreResult<Vec<FieldSnapshot>> {
        let posts = self.posts.read().await;
        let blocks = posts.get(&post_id).ok_or(StoreError::PostNotFound(post_id))?;
        if blocks.is_empty() {
            return Err(StoreError::NoBlocks(post_id));
        }
        Ok(blocks.clone())
    }

    async fn apply(&self, post_id: u64, changes: &ChangeSet) -> StoreResult<ApplyOutcome> {
        let mut posts = self.posts.write().await;
        let blocks = posts
            .get_mut(&post_id)
            .ok_or(StoreError::PostNotFound(post_id))?;

        if let ChangeSet::Single { block_index, .. } = changes {
            if !blocks.iter().any(|b| b.block_index == *block_index) {
                return Err(StoreError::BlockNotFound {
                    post_id,
                    index: *block_index,
                });
            }
        }

        let outcome = apply_change_set(blocks, changes);
        *blocks = outcome.blocks;

        tracing::info!(
            post_id,
            updated_count = outcome.updated_count,
            proposed = changes.field_count(),
            "Change-set applied"
        );
        Ok(ApplyOutcome {
            updated_count: outcome.updated_count,
        })
    }
}
