//! 查询执行服务模块

use std::time::Instant;

use serde_json::Value;
use validator::Validate;

use common::errors::AppResult;
use common::models::QueryPayload;
use common::utils::{fetch_json_rows, SqlValidator};

use crate::pool_manager::PoolManager;

/// 插件端点名称后缀
pub const QUERY_ENDPOINT_SUFFIX: &str = "_sql_query";

/// 从插件端点名称中解析逻辑数据库名，如 `shannon_sql_query` -> `shannon`
pub fn database_from_endpoint(endpoint: &str) -> Option<&str> {
    endpoint
        .strip_suffix(QUERY_ENDPOINT_SUFFIX)
        .filter(|db| !db.is_empty())
}

/// SQL 查询执行服务
pub struct QueryService<'a> {
    pools: &'a PoolManager,
}

impl<'a> QueryService<'a> {
    pub fn new(pools: &'a PoolManager) -> Self {
        Self { pools }
    }

    /// 在指定数据库上执行语句，返回行对象数组
    pub async fn execute(&self, database: &str, payload: &QueryPayload) -> AppResult<Value> {
        // 校验请求与 SQL
        payload.validate()?;
        SqlValidator::validate(&payload.query)?;

        let pool = self.pools.get_pool(database).await?;
        let start = Instant::now();
        let rows = fetch_json_rows(&pool, &payload.query, &payload.args).await?;

        tracing::info!(
            database,
            args = payload.args.len(),
            rows = rows.as_array().map(Vec::len).unwrap_or_default(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "查询执行完成"
        );
        Ok(rows)
    }
}
