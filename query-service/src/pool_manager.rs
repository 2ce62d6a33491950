//! PostgreSQL pool manager.
//!
//! One pool per logical database, created on first use and reused after
//! that. Every pool shares the server coordinates read from the
//! environment; only the database name differs.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::RwLock;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};

/// Server coordinates shared by every pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl ServerTarget {
    /// Reads `PG_HOST`, `PG_PORT`, `PG_USER` and `PG_PASSWORD`.
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            host: var("PG_HOST", "localhost"),
            port: var("PG_PORT", "5432").parse().unwrap_or(5432),
            user: var("PG_USER", "postgres"),
            password: var("PG_PASSWORD", ""),
        }
    }

    fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(database)
    }
}

/// Parses a comma separated allowlist. Empty means every database.
pub fn parse_allowlist(raw: &str) -> Option<HashSet<String>> {
    let names: HashSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!names.is_empty()).then_some(names)
}

/// Lazily created pools indexed by logical database name.
pub struct PoolManager {
    config: AppConfig,
    target: ServerTarget,
    allowed: Option<HashSet<String>>,
    pools: RwLock<HashMap<String, PgPool>>,
}

impl PoolManager {
    pub fn new(config: AppConfig, target: ServerTarget, allowed: Option<HashSet<String>>) -> Self {
        Self {
            config,
            target,
            allowed,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Pool manager configured from the environment (`ALLOWED_DATABASES`).
    pub fn from_env(config: AppConfig) -> Self {
        let allowed = std::env::var("ALLOWED_DATABASES")
            .ok()
            .and_then(|raw| parse_allowlist(&raw));
        Self::new(config, ServerTarget::from_env(), allowed)
    }

    /// Whether `database` may be served.
    pub fn is_allowed(&self, database: &str) -> bool {
        !database.is_empty()
            && self
                .allowed
                .as_ref()
                .is_none_or(|names| names.contains(database))
    }

    /// Gets the pool of a database, creating it on first use.
    pub async fn get_pool(&self, database: &str) -> AppResult<PgPool> {
        if !self.is_allowed(database) {
            return Err(AppError::DatabaseNotFound(database.to_string()));
        }

        if let Some(pool) = self.pools.read().await.get(database) {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write().await;
        // 写锁下再检查一次
        if let Some(pool) = pools.get(database) {
            return Ok(pool.clone());
        }

        let pool = self.try_create_pool(database).await?;
        tracing::info!(database, host = %self.target.host, "连接池已创建");
        pools.insert(database.to_string(), pool.clone());
        Ok(pool)
    }

    /// Number of pools created so far.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    async fn try_create_pool(&self, database: &str) -> AppResult<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .connect_with(self.target.connect_options(database))
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))
    }
}
