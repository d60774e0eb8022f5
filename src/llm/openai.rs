//! `OpenAI` chat completions provider implementation

use super::stream::{data_payload, StreamAdapter, StreamEvent};
use super::types::{LlmRequest, Role};
use super::{into_provider_stream, send_error, LlmError, LlmService, Provider, ProviderStream};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VENDOR: &str = "OpenAI";

/// Sampling temperature for models that accept a non-default value
const TEMPERATURE: f32 = 0.7;

/// `OpenAI` service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIService {
    pub fn new(api_key: String, model: String, gateway: Option<&str>) -> Result<Self, LlmError> {
        let base_url = match gateway {
            Some(gw) => format!("{}/openai/v1/chat/completions", gw.trim_end_matches('/')),
            None => "https://api.openai.com/v1/chat/completions".to_string(),
        };

        // Generations may run for minutes; only connection setup is bounded.
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

    /// gpt-5 and o1 family models reject anything but the default temperature
    fn supports_temperature(model: &str) -> bool {
        !model.contains("gpt-5") && !model.contains("o1")
    }

    fn translate_request<'a>(&'a self, request: &'a LlmRequest) -> ChatRequest<'a> {
        let messages = request
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &m.content,
            })
            .collect();

        ChatRequest {
            model: &self.model,
            messages,
            stream: true,
            temperature: Self::supports_temperature(&self.model).then_some(TEMPERATURE),
        }
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn open_stream(&self, request: &LlmRequest) -> Result<ProviderStream, LlmError> {
        let body = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(VENDOR, &e))?;

        into_provider_stream(VENDOR, response, Box::new(OpenAIAdapter)).await
    }

    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Decodes `data:` lines of a chat completions stream
#[derive(Debug, Default)]
pub struct OpenAIAdapter;

impl StreamAdapter for OpenAIAdapter {
    fn on_line(&mut self, line: &str) -> Option<StreamEvent> {
        let payload = data_payload(line)?;
        if payload == "[DONE]" {
            return Some(StreamEvent::Done);
        }

        let chunk: ChatChunk = serde_json::from_str(payload).ok()?;
        if let Some(error) = chunk.error {
            return Some(StreamEvent::Error(format!("{VENDOR} Error: {}", error.message)));
        }
        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map(StreamEvent::Delta)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}
