//! HTTP request handlers

use super::stream::frame_response;
use super::types::{
    ApplyResponse, BlockResponse, ChangeSetRequest, ChatRequest, ErrorResponse, PageBlock,
    PageResponse, ProposeResponse,
};
use super::AppState;
use crate::content::{ChangeSet, FieldSnapshot};
use crate::diff::{review_change_set, Review};
use crate::extract::extract;
use crate::llm::{LlmError, LlmRequest, Message, ProviderStream};
use crate::prompt::{build_system_prompt, PromptContext, Scope};
use crate::relay::{collect_text, relay};
use crate::store::StoreError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Snapshots
        .route("/api/posts/:post_id/blocks", get(get_page))
        .route(
            "/api/posts/:post_id/blocks/:index",
            get(get_block).post(get_block),
        )
        // Conversation turns
        .route("/api/chat", post(chat))
        .route("/api/propose", post(propose))
        // Review and commit
        .route("/api/review", post(review))
        .route("/api/apply", post(apply))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Snapshots
// ============================================================

async fn get_block(
    State(state): State<AppState>,
    Path((post_id, index)): Path<(u64, usize)>,
) -> Result<Json<BlockResponse>, AppError> {
    let snapshot = state.store.fetch_block(post_id, index).await?.text_only();
    Ok(Json(BlockResponse {
        layout: snapshot.layout,
        fields: snapshot.fields,
        block_index: snapshot.block_index,
    }))
}

async fn get_page(
    State(state): State<AppState>,
    Path(post_id): Path<u64>,
) -> Result<Json<PageResponse>, AppError> {
    let blocks: Vec<PageBlock> = state
        .store
        .fetch_page(post_id)
        .await?
        .iter()
        .map(|snapshot| {
            let snapshot = snapshot.text_only();
            PageBlock {
                index: snapshot.block_index,
                layout: snapshot.layout,
                fields: snapshot.fields,
            }
        })
        .collect();

    Ok(Json(PageResponse {
        total: blocks.len(),
        blocks,
    }))
}

// ============================================================
// Conversation Turns
// ============================================================

/// Prepend the system prompt built from fresh snapshots of what is being edited
async fn build_turn_request(state: &AppState, req: &ChatRequest) -> LlmRequest {
    let language = req.language();
    let mut block: Option<FieldSnapshot> = None;
    let mut page: Vec<FieldSnapshot> = Vec::new();

    match (&req.block_context, req.post_id) {
        (Some(ctx), Some(post_id)) => match state.store.fetch_block(post_id, ctx.index).await {
            Ok(snapshot) => block = Some(snapshot),
            Err(e) => tracing::debug!(post_id, block_index = ctx.index, error = %e, "No snapshot for prompt"),
        },
        (None, Some(post_id)) => match state.store.fetch_page(post_id).await {
            Ok(blocks) => page = blocks,
            Err(e) => tracing::debug!(post_id, error = %e, "No page snapshot for prompt"),
        },
        (_, None) => {}
    }

    let scope = match &req.block_context {
        Some(ctx) => Scope::Block {
            index: ctx.index,
            layout: &ctx.layout,
            snapshot: block.as_ref(),
        },
        None if req.post_id.is_some() => Scope::Page(&page),
        None => Scope::Detached,
    };
    let system = build_system_prompt(&PromptContext {
        language: language.as_ref(),
        scope,
    });

    let mut messages = Vec::with_capacity(req.messages.len() + 1);
    messages.push(Message::system(system));
    messages.extend(req.messages.iter().cloned());
    LlmRequest { messages }
}

async fn open_turn(state: &AppState, req: &ChatRequest) -> Result<ProviderStream, LlmError> {
    if req.messages.is_empty() {
        return Err(LlmError::invalid_request("No messages provided"));
    }
    let service = state.providers.active()?;
    let request = build_turn_request(state, req).await;

    tracing::info!(
        provider = %service.provider(),
        model = %service.model_id(),
        post_id = ?req.post_id,
        block_index = ?req.block_context.as_ref().map(|b| b.index),
        messages = req.messages.len(),
        "Starting turn"
    );
    service.open_stream(&request).await
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let opened = open_turn(&state, &req).await;
    frame_response(relay(opened))
}

async fn propose(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ProposeResponse>, AppError> {
    if req.messages.is_empty() {
        return Err(AppError::BadRequest("No messages provided".to_string()));
    }

    let opened = open_turn(&state, &req).await;
    let text = collect_text(relay(opened))
        .await
        .map_err(AppError::BadGateway)?;

    let mut extraction = extract(&text);
    // A bare `fields` reply carries no index; it targets the block being edited
    if let (Some(ChangeSet::Single { block_index, .. }), Some(ctx)) =
        (extraction.changes.as_mut(), &req.block_context)
    {
        *block_index = ctx.index;
    }

    let diff = match (&extraction.changes, req.post_id) {
        (Some(changes), Some(post_id)) => {
            let snapshots = load_snapshots(&state, post_id, changes)
                .await
                .unwrap_or_default();
            Some(review_change_set(&snapshots, changes))
        }
        (Some(changes), None) => Some(review_change_set(&[], changes)),
        (None, _) => None,
    };

    Ok(Json(ProposeResponse {
        message: extraction.conversational,
        changes: extraction.changes,
        diff,
    }))
}

// ============================================================
// Review and Commit
// ============================================================

/// Snapshots a change-set is compared against: the one block, or the page
async fn load_snapshots(
    state: &AppState,
    post_id: u64,
    changes: &ChangeSet,
) -> Result<Vec<FieldSnapshot>, StoreError> {
    match changes {
        ChangeSet::Single { block_index, .. } => {
            Ok(vec![state.store.fetch_block(post_id, *block_index).await?])
        }
        ChangeSet::Page { .. } => state.store.fetch_page(post_id).await,
    }
}

async fn review(
    State(state): State<AppState>,
    Json(req): Json<ChangeSetRequest>,
) -> Result<Json<Review>, AppError> {
    let snapshots = load_snapshots(&state, req.post_id, &req.changes).await?;
    Ok(Json(review_change_set(&snapshots, &req.changes)))
}

async fn apply(
    State(state): State<AppState>,
    Json(req): Json<ChangeSetRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let outcome = state.store.apply(req.post_id, &req.changes).await?;
    Ok(Json(ApplyResponse {
        updated_count: outcome.updated_count,
        message: format!("{} fields updated successfully", outcome.updated_count),
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("blockwright ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PostNotFound(_)
            | StoreError::BlockNotFound { .. }
            | StoreError::NoBlocks(_) => AppError::NotFound(e.to_string()),
            StoreError::Io(_) | StoreError::Parse(_) => {
                tracing::error!(error = %e, "Content store failure");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
