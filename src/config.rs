use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream provider configuration. API keys always travel with each
/// request and are never read from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Model used when a chat request names none.
    pub chat_model: String,
    /// Model used for both chunk and query embeddings.
    pub embedding_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4.1-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `$RAG_RELAY_CONFIG`, falling back to
    /// `rag-relay.toml` in the working directory. Returns `Default` if the
    /// file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {config_path}");
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config at {config_path}: {e} — using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No config file at {config_path} — using defaults");
                Self::default()
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn config_path() -> String {
        std::env::var("RAG_RELAY_CONFIG").unwrap_or_else(|_| "rag-relay.toml".to_string())
    }
}
