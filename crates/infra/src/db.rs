//! Database adapters: SQLite connection pool wiring.

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::CatalogConfig;
use crate::store::ensure_schema;

/// Whether `url` names a private in-memory database.
fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a pool for `config.database_url` and create the schema.
///
/// Each connection to an in-memory database sees its own empty database, so
/// such pools are pinned to one connection that is never recycled.
pub async fn connect_sqlite(config: &CatalogConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid DATABASE_URL {:?}", config.database_url))?
        .create_if_missing(true);

    let in_memory = is_in_memory(&config.database_url);
    let mut pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);
    pool_options = if in_memory {
        pool_options.max_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
        pool_options.max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .context("failed to connect to SQLite")?;
    ensure_schema(&pool).await.context("failed to create catalog schema")?;

    info!(
        in_memory,
        max_connections = pool.options().get_max_connections(),
        "sqlite catalog store ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://catalog?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://catalog.db"));
    }
}
