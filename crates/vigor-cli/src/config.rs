use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use vigor_agent::Features;
use vigor_llm::config::ProviderDetails;
use vigor_llm::{OpenAIConfig, OpenRouterConfig, ProviderConfig, ProviderType};
use vigor_stream::{AssemblerConfig, SourceOptions};

/// Environment overrides, strongest source after the TOML files
const ENV_OVERRIDES: [(&str, &str); 13] = [
    ("PROVIDER_TYPE", "provider.type"),
    ("PROVIDER_BASE_URL", "provider.base_url"),
    ("PROVIDER_REFERER", "provider.referer"),
    ("PROVIDER_TITLE", "provider.title"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_MAX_TOKENS", "llm.max_tokens"),
    ("STREAM_MAX_CHUNK_CHARS", "stream.max_chunk_chars"),
    ("STREAM_MAX_IDLE_MS", "stream.max_idle_ms"),
    ("STREAM_POLL_TIMEOUT_MS", "stream.poll_timeout_ms"),
    ("STREAM_QUEUE_CAPACITY", "stream.queue_capacity"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderSection,
    pub llm: LlmSection,
    pub stream: StreamSection,
    #[serde(default)]
    pub features: Features,
    pub logging: LoggingSection,

    // Secret (from ENV only)
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    #[serde(rename = "type", default)]
    pub kind: ProviderType,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    pub model: String,
    #[serde(default)]
    pub available_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<LlmSection> for SourceOptions {
    fn from(section: LlmSection) -> Self {
        SourceOptions::default()
            .with_temperature(section.temperature)
            .with_max_tokens(section.max_tokens)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamSection {
    pub max_chunk_chars: usize,
    pub max_idle_ms: u64,
    pub poll_timeout_ms: u64,
    pub queue_capacity: usize,
}

impl From<StreamSection> for AssemblerConfig {
    fn from(section: StreamSection) -> Self {
        AssemblerConfig::default()
            .with_max_chunk_chars(section.max_chunk_chars)
            .with_max_idle(Duration::from_millis(section.max_idle_ms))
            .with_poll_timeout(Duration::from_millis(section.poll_timeout_ms))
            .with_queue_capacity(section.queue_capacity)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (PROVIDER_, LLM_, STREAM_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        let dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", dir, env)).required(false));

        let mut cfg: Config = with_env_overrides(builder)?.build()?.try_deserialize()?;

        // Load secret from ENV (not in TOML)
        cfg.api_key = api_key_for(cfg.provider.kind)?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn provider_config(&self) -> ProviderConfig {
        match self.provider.kind {
            ProviderType::OpenAI => {
                let mut openai = OpenAIConfig::new(self.api_key.clone());
                if let Some(url) = &self.provider.base_url {
                    openai = openai.with_base_url(url.clone());
                }
                ProviderConfig {
                    details: ProviderDetails::OpenAI(openai),
                }
            }
            ProviderType::OpenRouter => {
                let mut openrouter = OpenRouterConfig::new(self.api_key.clone());
                if let Some(url) = &self.provider.base_url {
                    openrouter = openrouter.with_base_url(url.clone());
                }
                if let Some(referer) = &self.provider.referer {
                    openrouter = openrouter.with_referer(referer.clone());
                }
                if let Some(title) = &self.provider.title {
                    openrouter = openrouter.with_title(title.clone());
                }
                ProviderConfig::openrouter(openrouter)
            }
        }
    }

    /// Whether `model` may be selected with `/model`
    pub fn is_available_model(&self, model: &str) -> bool {
        self.llm.model == model || self.llm.available_models.iter().any(|m| m == model)
    }
}

fn with_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(key, std::env::var(var).ok())?;
    }
    Ok(builder)
}

fn api_key_for(kind: ProviderType) -> Result<String, ConfigError> {
    let preferred = match kind {
        ProviderType::OpenRouter => ["OPENROUTER_API_KEY", "OPENAI_API_KEY"],
        ProviderType::OpenAI => ["OPENAI_API_KEY", "OPENROUTER_API_KEY"],
    };
    preferred
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| {
            ConfigError::Message(format!("{} environment variable is required", preferred[0]))
        })
}
