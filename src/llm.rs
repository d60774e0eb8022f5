//! LLM provider abstraction
//!
//! Provides a common streaming interface over the supported vendors. A
//! service opens one streaming HTTP call per turn and hands back the raw
//! body together with the vendor adapter that decodes it.

mod anthropic;
mod error;
mod openai;
#[cfg(test)]
mod proptests;
mod registry;
mod stream;
#[cfg(test)]
pub mod testing;
mod types;

pub use anthropic::AnthropicService;
pub use error::LlmError;
#[cfg(test)]
pub use error::LlmErrorKind;
pub use openai::OpenAIService;
pub use registry::{LlmConfig, Provider, ProviderRegistry};
pub use stream::{ProviderStream, StreamAdapter, StreamEvent};
pub use types::*;

use async_trait::async_trait;
use futures::TryStreamExt;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Open a streaming completion. Resolves once the provider has accepted
    /// the request; the body is read lazily by whoever drives the stream.
    async fn open_stream(&self, request: &LlmRequest) -> Result<ProviderStream, LlmError>;

    /// Vendor behind this service
    fn provider(&self) -> Provider;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn open_stream(&self, request: &LlmRequest) -> Result<ProviderStream, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.open_stream(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    provider = %self.inner.provider(),
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    "LLM stream opened"
                );
            }
            Err(e) => {
                tracing::error!(
                    provider = %self.inner.provider(),
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM stream failed to open"
                );
            }
        }

        result
    }

    fn provider(&self) -> Provider {
        self.inner.provider()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Classify a reqwest failure that happened before any response arrived
fn send_error(vendor: &str, e: &reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::network(format!("{vendor} Error: Request timeout: {e}"))
    } else if e.is_connect() {
        LlmError::network(format!("{vendor} Error: Connection failed: {e}"))
    } else {
        LlmError::network(format!("{vendor} Error: Request failed: {e}"))
    }
}

/// Turn an HTTP response into a provider stream, or a classified error.
///
/// A non-success body is read in full into a buffer owned by this call and
/// inspected for the vendor's structured error message.
async fn into_provider_stream(
    vendor: &'static str,
    response: reqwest::Response,
    adapter: Box<dyn StreamAdapter>,
) -> Result<ProviderStream, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("{vendor} Error: Failed to read response: {e}")))?;
        return Err(LlmError::from_response(vendor, status.as_u16(), &body));
    }

    let bytes = response
        .bytes_stream()
        .map_err(move |e| LlmError::network(format!("{vendor} Error: Stream interrupted: {e}")));
    Ok(ProviderStream::new(Box::pin(bytes), adapter))
}
