use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Environment variable that overrides `postgres_url` from the YAML file.
pub const POSTGRES_URL_ENV: &str = "LEDGER_POSTGRES_URL";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// PostgreSQL connection URL for the ledger store (core only)
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default)]
    pub edge: EdgeConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoreConfig {
    pub listen_addr: String,
    pub max_connections: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".to_string(),
            max_connections: 20,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EdgeConfig {
    pub listen_addr: String,
    pub core_endpoint: String,
    /// Snowflake node id used when minting correlation ids
    pub node_id: u16,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            core_endpoint: "http://127.0.0.1:50051".to_string(),
            node_id: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// Deadline applied to every RPC call and every store transaction
    pub request_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_ms: 5_000 }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }
}

/// Bounded retry for read-only lookups. The transfer write path never retries.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 20,
        }
    }
}

impl RetryConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply environment overrides.
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)?;

        if let Ok(url) = std::env::var(POSTGRES_URL_ENV) {
            config.postgres_url = Some(url);
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config yaml")
    }
}
