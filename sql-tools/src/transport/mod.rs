//! Transports between the tools and the SQL engine.
//!
//! [`QueryTransport`] is the only thing the tools need to run SQL; the
//! plugin's other JSON endpoints (blob URLs) go through [`JsonEndpoint`].
//! Neither retries: a failure is returned to the caller as is.

mod direct;
mod http;

use async_trait::async_trait;
use serde_json::Value;

use common::errors::{AppError, AppResult};
use common::models::SqlStatement;

pub use direct::DirectTransport;
pub use http::HttpTransport;

/// Message of every transport failure.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to get query";

/// Message of every malformed or absent response body.
pub const NO_RESULT_SET_MESSAGE: &str = "No result set";

/// Executes a statement against a logical database.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Runs `statement` on `database` and returns the decoded rows, which
    /// are always a JSON array or object.
    async fn query(&self, database: &str, statement: &SqlStatement) -> AppResult<Value>;
}

/// Posts a JSON body to a named plugin endpoint.
#[async_trait]
pub trait JsonEndpoint: Send + Sync {
    async fn post_json(&self, endpoint: &str, body: Value) -> AppResult<Value>;
}

/// Submits caller-written SQL with its positional arguments unchanged.
pub async fn execute_query(
    transport: &dyn QueryTransport,
    database: &str,
    sql: &str,
    args: Vec<Value>,
) -> AppResult<Value> {
    if sql.trim().is_empty() {
        return Err(AppError::MissingArgument("query".into()));
    }
    tracing::info!(database, args = args.len(), "Executing SQL query");
    let statement = SqlStatement {
        sql: sql.to_string(),
        args,
    };
    transport.query(database, &statement).await
}

/// Accepts only arrays and objects; anything else is a malformed response.
pub(crate) fn ensure_result_set(value: Value) -> AppResult<Value> {
    match value {
        Value::Array(_) | Value::Object(_) => Ok(value),
        _ => Err(AppError::MalformedResponse(
            NO_RESULT_SET_MESSAGE.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arrays_and_objects_are_result_sets() {
        assert!(ensure_result_set(json!([])).is_ok());
        assert!(ensure_result_set(json!({ "blob_url": "u" })).is_ok());
    }

    #[test]
    fn test_null_and_scalars_are_rejected() {
        for value in [Value::Null, json!(42), json!("rows")] {
            let err = ensure_result_set(value).unwrap_err();
            assert!(matches!(err, AppError::MalformedResponse(ref m) if m == NO_RESULT_SET_MESSAGE));
        }
    }
}
