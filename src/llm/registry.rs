//! Provider registry: builds the configured LLM service

use super::{AnthropicService, LlmError, LlmService, LoggingService, OpenAIService};
use std::fmt;
use std::sync::Arc;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    #[default]
    OpenAI,
    Anthropic,
}

impl Provider {
    /// Parse a settings value; anything unrecognized selects `OpenAI`
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Provider::Anthropic,
            _ => Provider::OpenAI,
        }
    }

    /// Get the display name for this provider
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-5",
            Provider::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Model override; the provider default applies when unset
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Gateway base URL; when set, vendors are reached through it
    pub gateway: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            provider: non_empty("BLOCKWRIGHT_PROVIDER")
                .map(|v| Provider::from_setting(&v))
                .unwrap_or_default(),
            model: non_empty("BLOCKWRIGHT_MODEL"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            gateway: non_empty("LLM_GATEWAY"),
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
        }
        .filter(|k| !k.is_empty())
    }
}

/// Holds the active provider service, or the reason there is none.
///
/// A missing key is not a startup failure: the server still serves
/// snapshots and applies, and each turn reports the configuration error.
pub struct ProviderRegistry {
    active: Result<Arc<dyn LlmService>, LlmError>,
}

impl ProviderRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let active = Self::try_create(config).map(|service| {
            // Wrap with logging
            Arc::new(LoggingService::new(service)) as Arc<dyn LlmService>
        });

        match &active {
            Ok(service) => tracing::info!(
                provider = %service.provider(),
                model = %service.model_id(),
                gateway = config.gateway.is_some(),
                "LLM provider configured"
            ),
            Err(e) => tracing::warn!(error = %e, "No LLM provider available"),
        }

        Self { active }
    }

    /// Registry around an already-built service
    #[cfg(test)]
    pub fn with_service(service: Arc<dyn LlmService>) -> Self {
        Self {
            active: Ok(service),
        }
    }

    fn try_create(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
        // In gateway mode the gateway handles authentication
        let api_key = match (config.api_key(), config.gateway.as_deref()) {
            (Some(key), _) => key.to_string(),
            (None, Some(_)) => "implicit".to_string(),
            (None, None) => {
                return Err(LlmError::config(format!(
                    "{} API key not configured (set {})",
                    config.provider,
                    config.provider.api_key_env_var()
                )))
            }
        };

        let model = config.model().to_string();
        let gateway = config.gateway.as_deref();
        let service: Arc<dyn LlmService> = match config.provider {
            Provider::OpenAI => Arc::new(OpenAIService::new(api_key, model, gateway)?),
            Provider::Anthropic => Arc::new(AnthropicService::new(api_key, model, gateway)?),
        };
        Ok(service)
    }

    /// The service to use for a turn
    pub fn active(&self) -> Result<Arc<dyn LlmService>, LlmError> {
        self.active.clone()
    }
}
