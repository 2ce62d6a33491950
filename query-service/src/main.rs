//! SQL 查询后端服务
//!
//! 工具通过插件端点 `POST /api/plugins/postgresql/{db}_sql_query` 提交带
//! 绑定参数的语句，本服务在对应逻辑数据库的连接池上执行并返回行对象数组。

mod handlers;
mod pool_manager;
mod routes;
mod service;
mod state;

use axum::{routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::server;
use state::AppState;
use utoipa::OpenApi;

const SERVICE_NAME: &str = "query-service";
const DEFAULT_PORT: u16 = 8082;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "查询服务 API",
        version = "0.1.0",
        description = "SQL 查询后端服务"
    ),
    paths(handlers::execute_query, handlers::health_check),
    components(schemas(common::models::QueryPayload, handlers::HealthResponse)),
    tags(
        (name = "query", description = "查询执行端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    server::init_tracing();

    let mut config = AppConfig::load_with_service(SERVICE_NAME);
    if std::env::var("SERVER_PORT").is_err() {
        config.port = DEFAULT_PORT;
    }

    // 连接池在首次访问某个数据库时才创建
    let state = AppState::new(config.clone());
    let app = server::with_common_layers(
        Router::new()
            .merge(routes::router())
            .route("/api-docs/openapi.json", get(openapi_json)),
    )
    .with_state(state);

    server::serve(&config, app).await?;
    Ok(())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
