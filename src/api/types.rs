//! API request and response types

use crate::content::{ChangeSet, Fields};
use crate::diff::Review;
use crate::llm::Message;
use crate::prompt::Language;
use serde::{Deserialize, Serialize};

/// Block the editor widget is attached to
#[derive(Debug, Clone, Deserialize)]
pub struct BlockContext {
    pub index: usize,
    #[serde(default = "unknown_layout")]
    pub layout: String,
}

fn unknown_layout() -> String {
    "unknown".to_string()
}

/// Language as sent by clients: either `{code, name}` or just the code,
/// with the name in a sibling `languageName` field
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LanguageField {
    Pair(Language),
    Code(String),
}

/// Request to run one conversation turn
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub block_context: Option<BlockContext>,
    pub post_id: Option<u64>,
    pub language: Option<LanguageField>,
    pub language_name: Option<String>,
}

impl ChatRequest {
    pub fn language(&self) -> Option<Language> {
        match self.language.as_ref()? {
            LanguageField::Pair(language) => Some(language.clone()),
            LanguageField::Code(code) => Some(Language {
                code: code.clone(),
                name: self.language_name.clone()?,
            }),
        }
    }
}

/// Request carrying a change-set for review or apply
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetRequest {
    pub post_id: u64,
    pub changes: ChangeSet,
}

/// Response with one block snapshot
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub layout: String,
    pub fields: Fields,
    pub block_index: usize,
}

/// One block of a page snapshot
#[derive(Debug, Serialize)]
pub struct PageBlock {
    pub index: usize,
    pub layout: String,
    pub fields: Fields,
}

/// Response with every block on a post
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub blocks: Vec<PageBlock>,
    pub total: usize,
}

/// Response for a completed, non-streaming turn
#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    pub message: String,
    pub changes: Option<ChangeSet>,
    pub diff: Option<Review>,
}

/// Response for apply action
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub updated_count: usize,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
