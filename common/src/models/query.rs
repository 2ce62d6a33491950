//! SQL statement and plugin wire models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

/// A statement with `$n` placeholders and its bound arguments.
///
/// Tools never splice caller input into SQL text; everything variable goes
/// through `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
    /// Statement text.
    pub sql: String,
    /// Positional arguments for `$1`, `$2`, ...
    #[serde(default)]
    pub args: Vec<Value>,
}

impl SqlStatement {
    /// Creates a statement without arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Request body of the `{db}_sql_query` plugin endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryPayload {
    /// SQL statement to execute.
    #[validate(length(min = 1, message = "SQL statement is required"))]
    pub query: String,

    /// Positional arguments bound to `$1..$n`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub args: Vec<Value>,
}

impl From<&SqlStatement> for QueryPayload {
    fn from(statement: &SqlStatement) -> Self {
        Self {
            query: statement.sql.clone(),
            args: statement.args.clone(),
        }
    }
}

/// Request body of the `get_blob_url` plugin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlobUrlRequest {
    /// Blob prefix inside the fixed container.
    #[serde(rename = "blobName")]
    pub blob_name: String,
}

/// Response of the `get_blob_url` plugin endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlobUrlResponse {
    /// Signed, time-limited download URL.
    pub blob_url: String,
}
