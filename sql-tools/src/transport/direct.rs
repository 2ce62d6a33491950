//! Direct PostgreSQL transport.
//!
//! Opens one connection per statement from the persisted connection
//! settings and closes it again whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tokio::sync::RwLock;

use common::errors::{AppError, AppResult};
use common::models::SqlStatement;
use common::settings::{ConnectionSettings, SettingsStore};
use common::utils::fetch_json_rows;

use super::{ensure_result_set, QueryTransport};

const DEFAULT_PORT: u16 = 5432;

/// Connects with the settings panel's host/user/password/database/port.
#[derive(Clone)]
pub struct DirectTransport {
    settings: Arc<RwLock<SettingsStore>>,
    connect_timeout: Duration,
}

impl DirectTransport {
    pub fn new(settings: Arc<RwLock<SettingsStore>>, connect_timeout: Duration) -> Self {
        Self {
            settings,
            connect_timeout,
        }
    }

    /// Builds connect options. The settings' database wins over the
    /// logical database name when it is set.
    pub fn connect_options(settings: &ConnectionSettings, database: &str) -> AppResult<PgConnectOptions> {
        let host = settings.host.trim();
        if host.is_empty() {
            return Err(AppError::Misconfigured("database host is not set".into()));
        }

        let port = match settings.port.trim() {
            "" => DEFAULT_PORT,
            raw => raw
                .parse::<u16>()
                .map_err(|_| AppError::Misconfigured(format!("invalid database port: {raw}")))?,
        };

        let database = match settings.database.trim() {
            "" => database.trim(),
            configured => configured,
        };
        if database.is_empty() {
            return Err(AppError::Misconfigured("database name is not set".into()));
        }

        let mut options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);
        if !settings.user.trim().is_empty() {
            options = options.username(settings.user.trim());
        }
        if !settings.password.is_empty() {
            options = options.password(&settings.password);
        }
        Ok(options)
    }
}

#[async_trait]
impl QueryTransport for DirectTransport {
    async fn query(&self, database: &str, statement: &SqlStatement) -> AppResult<Value> {
        let settings = self.settings.read().await.settings().clone();
        let options = Self::connect_options(&settings, database)?;

        let mut conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| AppError::DatabaseConnection("connect timed out".into()))?
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        let result = fetch_json_rows(&mut conn, &statement.sql, &statement.args).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection");
        }

        ensure_result_set(result?)
    }
}
