//! Anthropic Claude provider implementation

use super::stream::{data_payload, StreamAdapter, StreamEvent};
use super::types::{LlmRequest, Role};
use super::{into_provider_stream, send_error, LlmError, LlmService, Provider, ProviderStream};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VENDOR: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2000;

/// Anthropic service implementation
pub struct AnthropicService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicService {
    pub fn new(api_key: String, model: String, gateway: Option<&str>) -> Result<Self, LlmError> {
        let base_url = match gateway {
            Some(gw) => format!("{}/anthropic/v1/messages", gw.trim_end_matches('/')),
            None => "https://api.anthropic.com/v1/messages".to_string(),
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }

    /// The system prompt travels in its own top-level field
    fn translate_request<'a>(&'a self, request: &'a LlmRequest) -> MessagesRequest<'a> {
        let messages = request
            .conversation()
            .map(|m| MessagesMessage {
                role: if m.role == Role::Assistant {
                    "assistant"
                } else {
                    "user"
                },
                content: &m.content,
            })
            .collect();

        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            stream: true,
            system: request.system_text(),
            messages,
        }
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn open_stream(&self, request: &LlmRequest) -> Result<ProviderStream, LlmError> {
        let body = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(VENDOR, &e))?;

        into_provider_stream(VENDOR, response, Box::new(AnthropicAdapter)).await
    }

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Decodes the Messages API event stream.
///
/// Only `data:` payloads are inspected; the JSON `type` field repeats what
/// the preceding `event:` line says.
#[derive(Debug, Default)]
pub struct AnthropicAdapter;

impl StreamAdapter for AnthropicAdapter {
    fn on_line(&mut self, line: &str) -> Option<StreamEvent> {
        let payload = data_payload(line)?;
        let event: MessagesEvent = serde_json::from_str(payload).ok()?;

        match event {
            MessagesEvent::ContentBlockDelta { delta } => delta.text.map(StreamEvent::Delta),
            MessagesEvent::MessageStop => Some(StreamEvent::Done),
            MessagesEvent::Error { error } => {
                Some(StreamEvent::Error(format!("{VENDOR} Error: {}", error.message)))
            }
            MessagesEvent::Other => None,
        }
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<MessagesMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct MessagesMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagesEvent {
    ContentBlockDelta {
        delta: BlockDelta,
    },
    MessageStop,
    Error {
        error: EventError,
    },
    #[serde(other)]
    Other,
}

/// `text_delta` carries `text`; `input_json_delta` and friends do not
#[derive(Debug, Deserialize)]
struct BlockDelta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventError {
    message: String,
}
