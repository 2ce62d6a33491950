//! Conversation transcript logging.
//!
//! One row per conversation name; logging the same name again replaces the
//! stored messages and bumps `updated_at`.

use serde_json::Value;

use common::errors::{AppError, AppResult};
use common::models::SqlStatement;

use crate::transport::QueryTransport;

const UPSERT_SQL: &str = "INSERT INTO sillytavern_logging (conversation_name, updated_at, messages)
VALUES ($1, CURRENT_TIMESTAMP, $2)
ON CONFLICT (conversation_name)
DO UPDATE
SET messages = EXCLUDED.messages
, updated_at = CURRENT_TIMESTAMP
";

/// Builds the upsert statement for a transcript.
pub fn upsert_statement(conversation_name: &str, messages: Option<&str>) -> AppResult<SqlStatement> {
    let name = conversation_name.trim();
    if name.is_empty() {
        return Err(AppError::MissingArgument("conversation name".into()));
    }
    let messages = messages.ok_or_else(|| AppError::MissingArgument("messages".into()))?;
    Ok(SqlStatement::new(UPSERT_SQL).bind(name).bind(messages))
}

/// Stores or replaces the transcript of a conversation.
pub async fn log_conversation(
    transport: &dyn QueryTransport,
    database: &str,
    conversation_name: &str,
    messages: Option<&str>,
) -> AppResult<Value> {
    let statement = upsert_statement(conversation_name, messages)?;
    tracing::info!(
        conversation = conversation_name.trim(),
        bytes = messages.map(str::len).unwrap_or_default(),
        "Logging conversation"
    );
    transport.query(database, &statement).await
}
