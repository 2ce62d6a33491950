//! Handler模块

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use common::errors::AppError;
use common::models::QueryPayload;
use crate::service::{database_from_endpoint, QueryService};
use crate::state::AppState;

/// 在逻辑数据库上执行 SQL 语句
///
/// 成功时直接返回行对象数组；失败时返回统一错误信封与非 2xx 状态码。
#[utoipa::path(
    post,
    path = "/api/plugins/postgresql/{endpoint}",
    tag = "query",
    params(
        ("endpoint" = String, Path, description = "插件端点，形如 `{db}_sql_query`")
    ),
    request_body = QueryPayload,
    responses(
        (status = 200, description = "查询执行成功，返回行对象数组"),
        (status = 400, description = "SQL 无效或校验错误"),
        (status = 404, description = "数据库或端点未找到"),
        (status = 502, description = "数据库连接失败")
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Json(payload): Json<QueryPayload>,
) -> Result<Json<Value>, AppError> {
    let database = database_from_endpoint(&endpoint)
        .ok_or_else(|| AppError::DatabaseNotFound(endpoint.clone()))?;

    let rows = QueryService::new(&state.pools)
        .execute(database, &payload)
        .await?;
    Ok(Json(rows))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pools: state.pools.pool_count().await,
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// 已创建的连接池数量
    pub pools: usize,
    pub timestamp: DateTime<Utc>,
}
