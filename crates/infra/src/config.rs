//! Configuration loading and representation.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `CATALOG_STORE` | `memory` | `memory` or `sqlite` |
//! | `DATABASE_URL` | `sqlite::memory:` | SQLite connection URL |
//! | `CATALOG_DB_MAX_CONNECTIONS` | `5` | pool size (forced to 1 for in-memory databases) |
//! | `CATALOG_DB_ACQUIRE_TIMEOUT_SECS` | `5` | pool acquire timeout |

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => bail!("unknown store backend {other:?} (expected \"memory\" or \"sqlite\")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl CatalogConfig {
    /// In-memory SQLite with default pool settings.
    pub fn sqlite_in_memory() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            ..Self::default()
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank values take their default;
    /// malformed values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(backend) = get("CATALOG_STORE") {
            config.backend = backend.parse::<StoreBackend>().context("invalid CATALOG_STORE")?;
        }
        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(max) = get("CATALOG_DB_MAX_CONNECTIONS") {
            config.max_connections = max
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid CATALOG_DB_MAX_CONNECTIONS: {max:?}"))?;
            if config.max_connections == 0 {
                bail!("CATALOG_DB_MAX_CONNECTIONS must be at least 1");
            }
        }
        if let Some(secs) = get("CATALOG_DB_ACQUIRE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("invalid CATALOG_DB_ACQUIRE_TIMEOUT_SECS: {secs:?}"))?;
            config.acquire_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
