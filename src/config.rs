use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub feed: FeedConfig,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// How many friends' posts are fetched concurrently
    pub fanout: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/social_graph.db".to_string(),
            max_connections: 8,
            min_connections: 1,
            acquire_timeout_secs: 5,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { fanout: 8 }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => StoreBackend::Sqlite,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND '{}', expected sqlite or memory", other),
        };

        let defaults = DatabaseConfig::default();
        Ok(Self {
            store: StoreConfig { backend },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.url),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS", defaults.min_connections),
                acquire_timeout_secs: parse_var(
                    "DATABASE_ACQUIRE_TIMEOUT_SECS",
                    defaults.acquire_timeout_secs,
                ),
                busy_timeout_ms: parse_var("DATABASE_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms),
            },
            feed: FeedConfig {
                fanout: parse_var("FEED_FANOUT", FeedConfig::default().fanout).max(1),
            },
            seed_sample_data: parse_var("SEED_SAMPLE_DATA", false),
        })
    }

    /// Configuration backed by the in-memory store, for tests and demos.
    pub fn in_memory() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            database: DatabaseConfig::default(),
            feed: FeedConfig::default(),
            seed_sample_data: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
