use crate::error::{EventsError, Result};
use serde::Deserialize;
use std::fs;

/// Runtime configuration, read from `config.toml`. Every section has
/// defaults so a missing file or a partial file still yields a usable
/// configuration; `REDIS_URL` in the environment overrides the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub local_api: LocalApiConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_local_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataConfig {
    /// Serve the bundled static dataset instead of calling the gateway.
    #[serde(default)]
    pub use_mock_data: bool,
    /// Allow the static dataset as the last fallback when the gateway is
    /// down and the override store is empty.
    #[serde(default)]
    pub mock_fallback: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EventsError::Config(format!("Failed to read config file '{}': {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective Redis URL: environment wins over the config file.
    pub fn redis_url(&self) -> Option<String> {
        std::env::var("REDIS_URL").ok().or_else(|| self.redis.url.clone())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for LocalApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_local_api_port(),
        }
    }
}

fn default_gateway_url() -> String {
    "http://gateway:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    1800
}

fn default_local_api_port() -> u16 {
    3001
}

fn default_true() -> bool {
    true
}
