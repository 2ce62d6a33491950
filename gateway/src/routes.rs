//! 工具宿主路由模块

use std::time::Instant;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::request_id::RequestId;
use common::models::{CommandInvocation, CommandSpec, ToolInvocation, ToolSpec};
use common::response::ApiResponse;
use common::settings::ConnectionSettings;

use crate::state::AppState;

/// 创建工具宿主路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(call_tool))
        .route("/api/commands", get(list_commands))
        .route("/api/commands/{name}", post(call_command))
        .route("/api/settings", get(get_settings))
        .route("/api/settings/{field}", put(update_setting))
}

/// 健康检查
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
        timestamp: Utc::now(),
    })
}

/// 列出全部函数调用工具
#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "tools",
    responses(
        (status = 200, description = "工具声明列表", body = ApiResponse<Vec<ToolSpec>>)
    )
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<ApiResponse<Vec<ToolSpec>>> {
    let specs = state.registry.tool_specs().await;
    Json(ApiResponse::ok_with_service(specs, state.config.service_name.clone()))
}

/// 调用函数工具，请求体为工具参数对象
#[utoipa::path(
    post,
    path = "/api/tools/{name}",
    tag = "tools",
    params(("name" = String, Path, description = "工具名称")),
    responses(
        (status = 200, description = "调用成功", body = ApiResponse<ToolInvocation>),
        (status = 400, description = "参数缺失或无效"),
        (status = 404, description = "工具未找到"),
        (status = 502, description = "查询后端调用失败")
    )
)]
pub async fn call_tool(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Result<Json<ApiResponse<ToolInvocation>>, AppError> {
    let started = Instant::now();
    let invocation = state.registry.call_tool(&name, args).await?;
    Ok(Json(
        ApiResponse::ok_with_service(invocation, state.config.service_name.clone())
            .with_request_id(request_id.as_str())
            .timed(started),
    ))
}

/// 列出全部斜杠命令
#[utoipa::path(
    get,
    path = "/api/commands",
    tag = "commands",
    responses(
        (status = 200, description = "命令声明列表", body = ApiResponse<Vec<CommandSpec>>)
    )
)]
pub async fn list_commands(State(state): State<AppState>) -> Json<ApiResponse<Vec<CommandSpec>>> {
    let specs = state.registry.command_specs().await;
    Json(ApiResponse::ok_with_service(specs, state.config.service_name.clone()))
}

/// 执行斜杠命令
#[utoipa::path(
    post,
    path = "/api/commands/{name}",
    tag = "commands",
    params(("name" = String, Path, description = "命令名称")),
    request_body = CommandInvocation,
    responses(
        (status = 200, description = "命令输出", body = ApiResponse<String>),
        (status = 400, description = "参数缺失或无效"),
        (status = 404, description = "命令未找到")
    )
)]
pub async fn call_command(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(name): Path<String>,
    Json(invocation): Json<CommandInvocation>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let started = Instant::now();
    let output = state
        .registry
        .call_command(&name, &invocation.args, &invocation.value)
        .await?;
    Ok(Json(
        ApiResponse::ok_with_service(output, state.config.service_name.clone())
            .with_request_id(request_id.as_str())
            .timed(started),
    ))
}

/// 读取连接设置（不回显密码）
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    responses(
        (status = 200, description = "当前设置", body = ApiResponse<ConnectionSettings>)
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Json<ApiResponse<ConnectionSettings>> {
    let settings = state.settings.read().await.settings().clone();
    Json(ApiResponse::ok_with_service(settings, state.config.service_name.clone()))
}

/// 修改单个设置字段并立即保存
#[utoipa::path(
    put,
    path = "/api/settings/{field}",
    tag = "settings",
    params(("field" = String, Path, description = "设置字段，如 host、apiKey")),
    request_body = SettingValue,
    responses(
        (status = 200, description = "更新后的设置", body = ApiResponse<ConnectionSettings>),
        (status = 400, description = "未知字段"),
        (status = 500, description = "设置文件写入失败")
    )
)]
pub async fn update_setting(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Json(body): Json<SettingValue>,
) -> Result<Json<ApiResponse<ConnectionSettings>>, AppError> {
    let mut store = state.settings.write().await;
    store.set_field(&field, body.value)?;
    store.save().await?;
    tracing::info!(field = %field, "设置已更新");

    let settings = store.settings().clone();
    Ok(Json(ApiResponse::ok_with_service(settings, state.config.service_name.clone())))
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
}

/// 设置字段的新值
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingValue {
    pub value: String,
}
