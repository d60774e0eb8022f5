//! Mock provider for testing
//!
//! Serves scripted vendor byte streams through the real adapters, so code
//! above the provider layer can be exercised without network I/O.

use super::anthropic::AnthropicAdapter;
use super::openai::OpenAIAdapter;
use super::{LlmError, LlmRequest, LlmService, Provider, ProviderStream, StreamAdapter};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Mutex;

type Script = Result<Vec<Result<Bytes, LlmError>>, LlmError>;

// ============================================================================
// Vendor wire fixtures
// ============================================================================

/// A complete, well-formed vendor event stream carrying `deltas`
pub fn vendor_stream(provider: Provider, deltas: &[&str], newline: &str) -> String {
    let mut out = String::new();
    let mut push = |line: String| {
        out.push_str(&line);
        out.push_str(newline);
    };

    match provider {
        Provider::OpenAI => {
            push(r#"data: {"id":"chatcmpl-1","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#.to_string());
            push(String::new());
            for delta in deltas {
                let text = serde_json::to_string(delta).unwrap();
                push(format!(
                    r#"data: {{"id":"chatcmpl-1","choices":[{{"index":0,"delta":{{"content":{text}}}}}]}}"#
                ));
                push(String::new());
            }
            push(r#"data: {"id":"chatcmpl-1","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#.to_string());
            push(String::new());
            push("data: [DONE]".to_string());
            push(String::new());
        }
        Provider::Anthropic => {
            push("event: message_start".to_string());
            push(r#"data: {"type":"message_start","message":{"id":"msg_1","usage":{"input_tokens":10}}}"#.to_string());
            push(String::new());
            push(": keep-alive".to_string());
            for delta in deltas {
                let text = serde_json::to_string(delta).unwrap();
                push("event: content_block_delta".to_string());
                push(format!(
                    r#"data: {{"type":"content_block_delta","index":0,"delta":{{"type":"text_delta","text":{text}}}}}"#
                ));
                push(String::new());
            }
            push("event: message_stop".to_string());
            push(r#"data: {"type":"message_stop"}"#.to_string());
            push(String::new());
        }
    }
    out
}

pub fn adapter_for(provider: Provider) -> Box<dyn StreamAdapter> {
    match provider {
        Provider::OpenAI => Box::new(OpenAIAdapter),
        Provider::Anthropic => Box::new(AnthropicAdapter),
    }
}

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock service that replays queued streams
pub struct MockLlmService {
    provider: Provider,
    scripts: Mutex<VecDeque<Script>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a well-formed stream that yields `deltas` then completes
    pub fn queue_deltas(&self, deltas: &[&str]) {
        let body = vendor_stream(self.provider, deltas, "\n");
        self.queue_chunks(vec![Ok(Bytes::from(body))]);
    }

    /// Queue raw body chunks, transport errors included
    pub fn queue_chunks(&self, chunks: Vec<Result<Bytes, LlmError>>) {
        self.scripts.lock().unwrap().push_back(Ok(chunks));
    }

    /// Queue a failure to open the stream
    pub fn queue_error(&self, error: LlmError) {
        self.scripts.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn open_stream(&self, request: &LlmRequest) -> Result<ProviderStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let chunks = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock stream queued")))?;
        Ok(ProviderStream::new(
            Box::pin(futures::stream::iter(chunks)),
            adapter_for(self.provider),
        ))
    }

    fn provider(&self) -> Provider {
        self.provider
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
