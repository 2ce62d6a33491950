//! 工具宿主服务
//!
//! 持有函数调用工具与斜杠命令的注册表，并通过 HTTP 暴露：
//! 工具与命令的声明和调用、连接设置的读取与修改。

mod routes;
mod state;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig, ToolsConfig};
use common::server;
use common::settings::SettingsStore;
use sql_tools::{ToolContext, ToolRegistry};
use state::AppState;
use tokio::sync::RwLock;
use tower_http::compression::CompressionLayer;
use tracing::info;
use utoipa::OpenApi;

const SERVICE_NAME: &str = "gateway";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SQL 工具 API",
        version = "0.1.0",
        description = "SQL 查询工具宿主"
    ),
    paths(
        routes::health_check,
        routes::list_tools,
        routes::call_tool,
        routes::list_commands,
        routes::call_command,
        routes::get_settings,
        routes::update_setting,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::SettingValue,
        common::models::ToolSpec,
        common::models::ToolInvocation,
        common::models::CommandSpec,
        common::models::CommandInvocation,
        common::models::ArgumentSpec,
        common::models::ArgumentType,
        common::settings::ConnectionSettings,
    )),
    tags(
        (name = "tools", description = "函数调用工具"),
        (name = "commands", description = "斜杠命令"),
        (name = "settings", description = "连接设置"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    server::init_tracing();

    let config = AppConfig::load_with_service(SERVICE_NAME);
    let tools_config = ToolsConfig::load();

    let settings = SettingsStore::load(&tools_config.settings_path).await?;
    info!(path = %settings.path().display(), "设置已加载");
    let settings = Arc::new(RwLock::new(settings));

    // 工具上下文与设置面板共享同一份设置
    let ctx = Arc::new(ToolContext::from_config(&config, tools_config, settings.clone())?);
    let registry = Arc::new(ToolRegistry::new());
    sql_tools::register_builtin(registry.as_ref(), ctx).await?;
    info!(
        tools = registry.tool_specs().await.len(),
        commands = registry.command_specs().await.len(),
        "工具注册完成"
    );

    let state = AppState::new(config.clone(), registry, settings);
    let app = server::with_common_layers(
        Router::new()
            .merge(routes::router())
            .route("/api-docs/openapi.json", get(openapi_json))
            .layer(CompressionLayer::new()),
    )
    .with_state(state);

    server::serve(&config, app).await?;
    Ok(())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
