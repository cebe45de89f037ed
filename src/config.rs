use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub lexgraph: LexgraphConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Storage and logging
#[derive(Debug, Clone, Deserialize)]
pub struct LexgraphConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Graph build defaults, used when a caller gives no bounds
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_depth")]
    pub default_depth: usize,
    #[serde(default = "default_max_nodes")]
    pub default_max_nodes: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            default_max_nodes: default_max_nodes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Relation type cache lifetime
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Artificial delay before each read served by the async service
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: default_simulated_latency_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_max_items")]
    pub max_items: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: default_history_max_items(),
        }
    }
}

const MAX_CACHE_TTL_MS: u64 = 5000;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_depth() -> usize {
    2
}

fn default_max_nodes() -> usize {
    50
}

fn default_cache_ttl_ms() -> u64 {
    1000
}

fn default_simulated_latency_ms() -> u64 {
    500
}

fn default_history_max_items() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lexgraph: LexgraphConfig {
                db_path: PathBuf::from("lexgraph.db"),
                log_level: default_log_level(),
            },
            graph: GraphConfig::default(),
            registry: RegistryConfig::default(),
            service: ServiceConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in LEXGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = Self::config_path();
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::parse(&config_str)
    }

    /// Like [`Config::load`], but falls back to defaults when no config file exists.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load()
    }

    fn config_path() -> PathBuf {
        std::env::var("LEXGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// Parse and validate a TOML document
    pub fn parse(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.graph.default_depth == 0 {
            anyhow::bail!("graph.default_depth must be greater than 0");
        }

        if self.graph.default_max_nodes == 0 {
            anyhow::bail!("graph.default_max_nodes must be greater than 0");
        }

        if self.history.max_items == 0 {
            anyhow::bail!("history.max_items must be greater than 0");
        }

        if self.registry.cache_ttl_ms > MAX_CACHE_TTL_MS {
            anyhow::bail!(
                "registry.cache_ttl_ms must be at most {} (got {})",
                MAX_CACHE_TTL_MS,
                self.registry.cache_ttl_ms
            );
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.lexgraph.db_path
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.registry.cache_ttl_ms)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.service.simulated_latency_ms)
    }
}
