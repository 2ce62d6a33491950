//! Application error types.
//!
//! Every fallible operation in the workspace returns [`AppResult`]. The
//! HTTP surfaces render [`AppError`] through the common response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across all crates.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// The query endpoint answered with a non-success status, or could not be reached.
    #[error("{0}")]
    TransportFailure(String),

    /// The response body was absent or had an unexpected shape.
    #[error("{0}")]
    MalformedResponse(String),

    /// A required tool or command argument was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// Required connection settings are unset.
    #[error("misconfigured: {0}")]
    Misconfigured(String),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The SQL statement contains a forbidden operation.
    #[error("unsafe SQL: {0}")]
    UnsafeSql(String),

    /// Opening a database connection failed.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// Executing a statement failed.
    #[error("database query error: {0}")]
    DatabaseQuery(String),

    /// The logical database is not served by this back-end.
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// No tool is registered under the name.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// No slash command is registered under the name.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A tool or command with the same name is already registered.
    #[error("tool already registered: {0}")]
    ToolAlreadyExists(String),

    /// Reading or writing the settings document failed.
    #[error("settings error: {0}")]
    Settings(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::TransportFailure(_) => "TRANSPORT_FAILURE",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::MissingArgument(_) => "MISSING_ARGUMENT",
            AppError::Misconfigured(_) => "MISCONFIGURED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UnsafeSql(_) => "UNSAFE_SQL",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::DatabaseNotFound(_) => "DATABASE_NOT_FOUND",
            AppError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            AppError::CommandNotFound(_) => "COMMAND_NOT_FOUND",
            AppError::ToolAlreadyExists(_) => "TOOL_ALREADY_EXISTS",
            AppError::Settings(_) => "SETTINGS_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used when the error crosses an HTTP boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingArgument(_)
            | AppError::Validation(_)
            | AppError::UnsafeSql(_)
            | AppError::DatabaseQuery(_) => StatusCode::BAD_REQUEST,
            AppError::ToolNotFound(_) | AppError::CommandNotFound(_) | AppError::DatabaseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::ToolAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::TransportFailure(_)
            | AppError::MalformedResponse(_)
            | AppError::DatabaseConnection(_) => StatusCode::BAD_GATEWAY,
            AppError::Misconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Settings(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::MalformedResponse(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => AppError::DatabaseConnection(e.to_string()),
            other => AppError::DatabaseQuery(other.to_string()),
        }
    }
}
