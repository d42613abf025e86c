// Provider configuration and client factory
// Clients are built from explicit values; nothing here reads the environment.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::openai::{OpenAIClient, OPENAI_API_BASE};
use crate::traits::ChatClient;

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Type of LLM provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    OpenRouter,
}

/// Configuration for the OpenAI API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Defaults to https://api.openai.com/v1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Configuration for OpenRouter
///
/// `referer` and `title` are sent as the `HTTP-Referer` and `X-Title` headers
/// OpenRouter uses for app attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    pub api_key: String,
    #[serde(default = "default_openrouter_base")]
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_openrouter_base() -> String {
    OPENROUTER_API_BASE.to_string()
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_openrouter_base(),
            referer: None,
            title: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    OpenAI(OpenAIConfig),
    OpenRouter(OpenRouterConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAI(OpenAIConfig::new(api_key)),
        }
    }

    pub fn openrouter(config: OpenRouterConfig) -> Self {
        Self {
            details: ProviderDetails::OpenRouter(config),
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAI(_) => ProviderType::OpenAI,
            ProviderDetails::OpenRouter(_) => ProviderType::OpenRouter,
        }
    }

    pub fn base_url(&self) -> &str {
        match &self.details {
            ProviderDetails::OpenAI(c) => c.base_url.as_deref().unwrap_or(OPENAI_API_BASE),
            ProviderDetails::OpenRouter(c) => &c.base_url,
        }
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        let provider = config.provider_type();
        let client = match config.details {
            ProviderDetails::OpenAI(openai_config) => {
                let mut builder = OpenAIClient::builder().api_key(openai_config.api_key);
                if let Some(base_url) = openai_config.base_url {
                    builder = builder.base_url(base_url);
                }
                builder.build()?
            }
            ProviderDetails::OpenRouter(router_config) => {
                let mut builder = OpenAIClient::builder()
                    .api_key(router_config.api_key)
                    .base_url(router_config.base_url);
                if let Some(referer) = router_config.referer {
                    builder = builder.header("HTTP-Referer", referer);
                }
                if let Some(title) = router_config.title {
                    builder = builder.header("X-Title", title);
                }
                builder.build()?
            }
        };

        tracing::info!(provider = ?provider, base_url = %client.base_url(), "Chat client created");
        Ok(Arc::new(client))
    }
}
