//! HTTP transport: POST JSON to the query back-end's plugin endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use common::config::ToolsConfig;
use common::errors::{AppError, AppResult};
use common::models::{QueryPayload, SqlStatement};

use super::{ensure_result_set, JsonEndpoint, QueryTransport, NO_RESULT_SET_MESSAGE, TRANSPORT_FAILURE_MESSAGE};

/// Talks to `POST {base}{plugin_path}/{database}_sql_query`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ToolsConfig,
}

impl HttpTransport {
    /// Creates a transport with its own client and request timeout.
    pub fn new(config: ToolsConfig, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a transport sharing an existing client.
    pub fn with_client(client: reqwest::Client, config: ToolsConfig) -> Self {
        Self { client, config }
    }

    /// Same client and plugin path, another base URL.
    pub fn pointing_at(mut self, base_url: &str) -> Self {
        self.config.query_service_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Endpoint name serving SQL for a logical database.
    pub fn query_endpoint(database: &str) -> String {
        format!("{database}_sql_query")
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> AppResult<Value> {
        let url = self.config.plugin_url(endpoint);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Query endpoint unreachable");
                AppError::TransportFailure(format!("{TRANSPORT_FAILURE_MESSAGE}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Query endpoint returned an error status");
            return Err(AppError::TransportFailure(TRANSPORT_FAILURE_MESSAGE.to_string()));
        }

        let value: Value = response.json().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Query endpoint returned an undecodable body");
            AppError::MalformedResponse(NO_RESULT_SET_MESSAGE.to_string())
        })?;

        ensure_result_set(value)
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn query(&self, database: &str, statement: &SqlStatement) -> AppResult<Value> {
        tracing::debug!(database, args = statement.args.len(), "Posting statement");
        let payload = QueryPayload::from(statement);
        self.post(&Self::query_endpoint(database), &payload).await
    }
}

#[async_trait]
impl JsonEndpoint for HttpTransport {
    async fn post_json(&self, endpoint: &str, body: Value) -> AppResult<Value> {
        self.post(endpoint, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn spawn_plugin() -> ToolsConfig {
        let app = Router::new()
            .route(
                "/api/plugins/postgresql/shannon_sql_query",
                post(|Json(payload): Json<QueryPayload>| async move {
                    Json(json!([{ "query": payload.query, "args": payload.args }]))
                }),
            )
            .route(
                "/api/plugins/postgresql/broken_sql_query",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/api/plugins/postgresql/scalar_sql_query",
                post(|| async { Json(json!(42)) }),
            )
            .route(
                "/api/plugins/postgresql/text_sql_query",
                post(|| async { "not json" }),
            )
            .route(
                "/api/plugins/postgresql/get_blob_url",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "blob_url": format!("https://blob/{}", body["blobName"].as_str().unwrap_or_default()) }))
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        ToolsConfig {
            query_service_url: format!("http://{addr}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_query_posts_sql_and_args() {
        let transport = HttpTransport::new(spawn_plugin().await, Duration::from_secs(5)).unwrap();
        let statement = SqlStatement::new("SELECT $1").bind("frc_orders");

        let rows = transport.query("shannon", &statement).await.unwrap();

        assert_eq!(rows[0]["query"], "SELECT $1");
        assert_eq!(rows[0]["args"], json!(["frc_orders"]));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let transport = HttpTransport::new(spawn_plugin().await, Duration::from_secs(5)).unwrap();

        let err = transport
            .query("broken", &SqlStatement::new("SELECT 1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TransportFailure(ref m) if m == TRANSPORT_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_scalar_and_text_bodies_are_malformed() {
        let transport = HttpTransport::new(spawn_plugin().await, Duration::from_secs(5)).unwrap();

        for database in ["scalar", "text"] {
            let err = transport
                .query(database, &SqlStatement::new("SELECT 1"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::MalformedResponse(_)), "{database}: {err}");
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let config = ToolsConfig {
            query_service_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        let transport = HttpTransport::new(config, Duration::from_secs(2)).unwrap();

        let err = transport
            .query("shannon", &SqlStatement::new("SELECT 1"))
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with(TRANSPORT_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_post_json_reaches_named_endpoint() {
        let transport = HttpTransport::new(spawn_plugin().await, Duration::from_secs(5)).unwrap();

        let body = transport
            .post_json("get_blob_url", json!({ "blobName": "exports/a.csv" }))
            .await
            .unwrap();

        assert_eq!(body["blob_url"], "https://blob/exports/a.csv");
    }
}
