use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use copydesk::stream::StreamConfig;
use copydesk::types::DEFAULT_LANGUAGE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub generation: GenerationConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Where `login` stores the token between runs
    #[serde(default)]
    pub session_file: Option<String>,
}

impl From<&GenerationConfig> for StreamConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            connect_timeout_secs: config.connect_timeout_secs,
            request_timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Record store base URL; saving is disabled when unset
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml (or the file passed with `--config`)
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (`COPYDESK_GENERATION__BASE_URL`, ...)
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let base = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("config/default").required(false),
        };

        let builder = ConfigLoader::builder()
            .set_default("generation.base_url", "http://localhost:8000")?
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "pretty")?
            // 1. Load default config
            .add_source(base)
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("COPYDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.token = std::env::var("COPYDESK_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig::from(&self.generation)
    }
}
