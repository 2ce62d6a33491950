//! Built-in slash commands.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use common::errors::{AppError, AppResult};
use common::models::{ArgumentSpec, ArgumentType, CommandSpec};

use crate::blob::resolve_blob_url;
use crate::context::ToolContext;
use crate::conversation::log_conversation;
use crate::format::{definitions_markdown, pretty_json};
use crate::lineage::{decode_rows, fetch_lineage, parse_depth};
use crate::registry::SlashCommand;
use crate::search::find_candidate_tables;
use crate::transport::execute_query;

/// Every built-in slash command.
pub fn builtin_commands(ctx: Arc<ToolContext>) -> Vec<Arc<dyn SlashCommand>> {
    vec![
        Arc::new(SqlQueryCommand { ctx: ctx.clone() }),
        Arc::new(DefinitionsCommand { ctx: ctx.clone() }),
        Arc::new(CandidateTablesCommand { ctx: ctx.clone() }),
        Arc::new(LogConversationCommand { ctx: ctx.clone() }),
        Arc::new(BlobUrlCommand { ctx }),
    ]
}

fn value_arg<'a>(value: &'a str, name: &str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::MissingArgument(name.to_string()));
    }
    Ok(value)
}

/// `/sqlquery <query>`
pub struct SqlQueryCommand {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl SlashCommand for SqlQueryCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec {
            name: "sqlquery".into(),
            help_string: "Execute a SQL query against the configured database.".into(),
            returns: "JSON array of result rows".into(),
            unnamed_argument_list: vec![ArgumentSpec::unnamed("The SQL query to run").required()],
            named_argument_list: Vec::new(),
        }
    }

    async fn call(&self, _args: &HashMap<String, String>, value: &str) -> AppResult<String> {
        let query = value_arg(value, "query")?;
        let rows = execute_query(
            self.ctx.transport.as_ref(),
            &self.ctx.config.lineage_database,
            query,
            Vec::new(),
        )
        .await?;
        pretty_json(&rows)
    }
}

/// `/get-sql-definitions <table> recursive_depth=N`
pub struct DefinitionsCommand {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl SlashCommand for DefinitionsCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec {
            name: "get-sql-definitions".into(),
            help_string: "Retrieve the definition of a table and of the tables it is built from.".into(),
            returns: "Markdown with one SQL block per table".into(),
            unnamed_argument_list: vec![ArgumentSpec::unnamed("The table whose definition is sought").required()],
            named_argument_list: vec![ArgumentSpec::named(
                "recursive_depth",
                "Levels of provenance to pull; 0 returns the table only",
                ArgumentType::Number,
            )
            .with_default("1")],
        }
    }

    async fn call(&self, args: &HashMap<String, String>, value: &str) -> AppResult<String> {
        let table_name = value_arg(value, "table_name")?;
        let depth = parse_depth(args.get("recursive_depth").map(String::as_str).unwrap_or_default())?;
        let request = self.ctx.lineage_request(table_name, depth);
        let rows = fetch_lineage(self.ctx.transport.as_ref(), &self.ctx.config.lineage_database, &request).await?;
        Ok(definitions_markdown(&decode_rows(rows)?))
    }
}

/// `/find-candidate-table-names measure_search_term=... report_search_term=...`
pub struct CandidateTablesCommand {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl SlashCommand for CandidateTablesCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec {
            name: "find-candidate-table-names".into(),
            help_string: "Find tables that may hold a measure of a report.".into(),
            returns: "JSON array of candidate tables".into(),
            unnamed_argument_list: Vec::new(),
            named_argument_list: vec![
                ArgumentSpec::named("measure_search_term", "Whole or partial measure name", ArgumentType::String)
                    .required(),
                ArgumentSpec::named("report_search_term", "Whole or partial report name", ArgumentType::String)
                    .required(),
            ],
        }
    }

    async fn call(&self, args: &HashMap<String, String>, _value: &str) -> AppResult<String> {
        let rows = find_candidate_tables(
            self.ctx.transport.as_ref(),
            &self.ctx.config.lineage_database,
            args.get("measure_search_term").map(String::as_str),
            args.get("report_search_term").map(String::as_str),
        )
        .await?;
        pretty_json(&rows)
    }
}

/// `/log-conversation <name> messages=...`
pub struct LogConversationCommand {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl SlashCommand for LogConversationCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec {
            name: "log-conversation".into(),
            help_string: "Store or replace the transcript of a conversation.".into(),
            returns: "Nothing".into(),
            unnamed_argument_list: vec![ArgumentSpec::unnamed("Conversation name").required()],
            named_argument_list: vec![ArgumentSpec::named(
                "messages",
                "Serialized conversation transcript",
                ArgumentType::String,
            )
            .required()],
        }
    }

    async fn call(&self, args: &HashMap<String, String>, value: &str) -> AppResult<String> {
        log_conversation(
            self.ctx.transport.as_ref(),
            &self.ctx.config.logging_database,
            value,
            args.get("messages").map(String::as_str),
        )
        .await?;
        Ok(String::new())
    }
}

/// `/get-blob-url <blob>`
pub struct BlobUrlCommand {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl SlashCommand for BlobUrlCommand {
    fn spec(&self) -> CommandSpec {
        CommandSpec {
            name: "get-blob-url".into(),
            help_string: "Get a signed download URL for a blob.".into(),
            returns: "JSON string with the URL".into(),
            unnamed_argument_list: vec![ArgumentSpec::unnamed("Blob name").required()],
            named_argument_list: Vec::new(),
        }
    }

    async fn call(&self, _args: &HashMap<String, String>, value: &str) -> AppResult<String> {
        let url = resolve_blob_url(self.ctx.endpoint.as_ref(), value).await?;
        Ok(serde_json::to_string(&url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, named, FakeTransport};
    use serde_json::json;

    fn command<'a>(commands: &'a [Arc<dyn SlashCommand>], name: &str) -> &'a Arc<dyn SlashCommand> {
        commands.iter().find(|c| c.spec().name == name).unwrap()
    }

    #[tokio::test]
    async fn test_sqlquery_returns_pretty_json() {
        let transport = FakeTransport::returning(json!([{ "n": 1 }]));
        let commands = builtin_commands(context(transport.clone()));

        let out = command(&commands, "sqlquery")
            .call(&HashMap::new(), "SELECT 1 AS n")
            .await
            .unwrap();

        assert_eq!(out, "[\n  {\n    \"n\": 1\n  }\n]");
        assert!(transport.last().await.1.args.is_empty());
    }

    #[tokio::test]
    async fn test_definitions_render_markdown() {
        let transport = FakeTransport::returning(json!([
            { "query_name": "frc_orders", "query_text": "a\n\nb\n\nINSERT INTO x" },
            { "query_name": "stg_orders", "query_text": "c" }
        ]));
        let commands = builtin_commands(context(transport.clone()));

        let out = command(&commands, "get-sql-definitions")
            .call(&named(&[("recursive_depth", "2")]), "frc_orders")
            .await
            .unwrap();

        assert_eq!(
            out,
            "###frc_orders\n\n```sql\na\nb\n```\n\n\n###stg_orders\n\n```sql\nc\n```\n\n"
        );
        assert_eq!(transport.last().await.1.args[1], json!(2));
    }

    #[tokio::test]
    async fn test_definitions_reject_bad_depth() {
        let transport = FakeTransport::returning(json!([]));
        let commands = builtin_commands(context(transport.clone()));

        let err = command(&commands, "get-sql-definitions")
            .call(&named(&[("recursive_depth", "deep")]), "frc_orders")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(transport.calls().await, 0);
    }

    #[tokio::test]
    async fn test_candidate_search_with_blank_term() {
        let transport = FakeTransport::returning(json!([{ "query_name": "x" }]));
        let commands = builtin_commands(context(transport.clone()));

        let out = command(&commands, "find-candidate-table-names")
            .call(&named(&[("measure_search_term", "revenue"), ("report_search_term", "")]), "")
            .await
            .unwrap();

        assert_eq!(out, "[]");
        assert_eq!(transport.calls().await, 0);
    }

    #[tokio::test]
    async fn test_log_conversation_targets_logging_database() {
        let transport = FakeTransport::returning(json!([]));
        let commands = builtin_commands(context(transport.clone()));

        let out = command(&commands, "log-conversation")
            .call(&named(&[("messages", "[{\"role\":\"user\"}]")]), "chat-1")
            .await
            .unwrap();

        assert_eq!(out, "");
        let (database, statement) = transport.last().await;
        assert_eq!(database, "liffey");
        assert_eq!(statement.args, vec![json!("chat-1"), json!("[{\"role\":\"user\"}]")]);
    }

    #[tokio::test]
    async fn test_log_conversation_without_messages() {
        let transport = FakeTransport::returning(json!([]));
        let commands = builtin_commands(context(transport.clone()));

        let err = command(&commands, "log-conversation")
            .call(&HashMap::new(), "chat-1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingArgument(_)));
    }

    #[tokio::test]
    async fn test_blob_url_is_json_encoded() {
        let commands = builtin_commands(context(FakeTransport::returning(json!([]))));
        let out = command(&commands, "get-blob-url")
            .call(&HashMap::new(), "out/a.csv")
            .await
            .unwrap();
        assert_eq!(out, "\"https://blob/out/a.csv\"");
    }

    #[test]
    fn test_command_specs() {
        let commands = builtin_commands(context(FakeTransport::returning(json!([]))));
        let definitions = command(&commands, "get-sql-definitions").spec();
        assert_eq!(definitions.named_argument_list[0].default_value.as_deref(), Some("1"));
        assert_eq!(commands.len(), 5);
    }
}
