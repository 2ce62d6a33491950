//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/plugins/postgresql/{endpoint}", post(handlers::execute_query))
        .route("/api/health", get(handlers::health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use common::config::AppConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        router().with_state(AppState::new(AppConfig::load_with_service("query-service")))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_plugin_endpoint_is_not_found() {
        let request = Request::post("/api/plugins/postgresql/get_table")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query":"SELECT 1"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "DATABASE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unsafe_statement_is_rejected() {
        let request = Request::post("/api/plugins/postgresql/shannon_sql_query")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"query":"DROP TABLE frc_sql_code"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
