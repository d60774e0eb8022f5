//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Config, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    /// Classify a non-success provider response.
    ///
    /// The vendor's own message (`error.message` in the JSON body) is
    /// surfaced verbatim behind a `"<Vendor> Error: "` prefix; the raw body
    /// is used when it is not structured.
    pub fn from_response(vendor: &str, status: u16, body: &str) -> Self {
        let detail = vendor_error_message(body)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        let message = format!("{vendor} Error: {detail}");

        let kind = match status {
            401 | 403 => LlmErrorKind::Auth,
            429 => LlmErrorKind::RateLimit,
            400 | 404 | 422 => LlmErrorKind::InvalidRequest,
            500..=599 => LlmErrorKind::ServerError,
            _ => LlmErrorKind::Unknown,
        };
        Self::new(kind, message)
    }
}

/// Pull `error.message` out of a vendor error body
fn vendor_error_message(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// No provider key or unusable provider settings - not retryable
    Config,
    /// Connection failures and mid-stream drops - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Authentication failed (401, 403) - not retryable
    Auth,
    /// Bad request (400) - not retryable
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl LlmErrorKind {
    /// Whether a client may reasonably re-run the whole turn
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
