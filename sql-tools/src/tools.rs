//! Built-in function-calling tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use common::errors::{AppError, AppResult};

use crate::blob::resolve_blob_url;
use crate::context::ToolContext;
use crate::lineage::{check_depth, fetch_lineage, parse_depth, DEFAULT_DEPTH};
use crate::registry::ToolDefinition;
use crate::search::find_candidate_tables;
use crate::transport::execute_query;

const SCHEMA_DRAFT: &str = "http://json-schema.org/draft-04/schema#";

/// Every built-in tool. The location tool is only present when a location
/// endpoint is configured.
pub fn builtin_tools(ctx: Arc<ToolContext>) -> Vec<Arc<dyn ToolDefinition>> {
    let mut tools: Vec<Arc<dyn ToolDefinition>> = vec![
        Arc::new(ExecuteSqlQueryTool { ctx: ctx.clone() }),
        Arc::new(TableDefinitionsTool { ctx: ctx.clone() }),
        Arc::new(CandidateTablesTool { ctx: ctx.clone() }),
        Arc::new(BlobUrlTool { ctx: ctx.clone() }),
    ];
    if ctx.location.is_some() {
        tools.push(Arc::new(LocationKeyTool { ctx }));
    }
    tools
}

// ============== Argument helpers ==============

fn arguments(args: &Value) -> AppResult<&Map<String, Value>> {
    args.as_object()
        .ok_or_else(|| AppError::MissingArgument("No arguments provided".into()))
}

fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> AppResult<&'a str> {
    optional_str(args, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::MissingArgument(key.to_string()))
}

/// Reads `recursive_depth` (or `depth`) as a number or numeric string.
fn depth_arg(args: &Map<String, Value>) -> AppResult<u32> {
    for key in ["recursive_depth", "depth"] {
        match args.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(raw)) => return parse_depth(raw),
            Some(Value::Number(n)) => {
                return n
                    .as_u64()
                    .and_then(|d| u32::try_from(d).ok())
                    .ok_or_else(|| AppError::Validation(format!("{key} must be a non-negative integer")))
                    .and_then(check_depth)
            }
            Some(_) => return Err(AppError::Validation(format!("{key} must be a number"))),
        }
    }
    Ok(DEFAULT_DEPTH)
}

// ============== Tools ==============

/// Runs caller-supplied SQL with its positional arguments.
pub struct ExecuteSqlQueryTool {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl ToolDefinition for ExecuteSqlQueryTool {
    fn name(&self) -> &str {
        "ExecuteSqlQuery"
    }

    fn display_name(&self) -> &str {
        "Execute SQL Query"
    }

    fn description(&self) -> &str {
        "Execute a SQL query against the configured database."
    }

    fn parameters(&self) -> Value {
        json!({
            "$schema": SCHEMA_DRAFT,
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SQL query to execute against the configured database."
                },
                "args": {
                    "type": "array",
                    "description": "The arguments for parameterized SQL queries ($1, $2, ...).",
                    "items": { "type": "string" }
                }
            },
            "required": ["query"]
        })
    }

    fn format_message(&self, args: &Value) -> String {
        match args.get("query").and_then(Value::as_str) {
            Some(q) if !q.is_empty() => "Executing SQL query...".into(),
            _ => String::new(),
        }
    }

    async fn call(&self, args: Value) -> AppResult<Value> {
        let args = arguments(&args)?;
        let query = required_str(args, "query")?;
        let params = match args.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(AppError::Validation("args must be an array".into())),
        };
        execute_query(
            self.ctx.transport.as_ref(),
            &self.ctx.config.lineage_database,
            query,
            params,
        )
        .await
    }
}

/// Returns the definitions of a table and its ancestors as raw rows.
pub struct TableDefinitionsTool {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl ToolDefinition for TableDefinitionsTool {
    fn name(&self) -> &str {
        "getSQLTableDDLRecursively"
    }

    fn display_name(&self) -> &str {
        "Retrieve the definition for the table of interest and ancestor tables"
    }

    fn description(&self) -> &str {
        "Given a SQL table name, return the `CREATE TABLE AS` DDL used to generate the data stored in that table along with ancestor tables up to `recursive_depth` levels of provenance."
    }

    fn parameters(&self) -> Value {
        json!({
            "$schema": SCHEMA_DRAFT,
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "The SQL table for which the source code is sought."
                },
                "recursive_depth": {
                    "type": "string",
                    "description": "Number of levels of provenance to pull. 0 pulls the DDL of the table only, 2 adds parent and grandparent tables. Defaults to 1, at most 10."
                }
            },
            "required": ["table_name"]
        })
    }

    fn format_message(&self, args: &Value) -> String {
        match args.get("table_name").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => "Retrieving SQL table definition...".into(),
            _ => String::new(),
        }
    }

    async fn call(&self, args: Value) -> AppResult<Value> {
        let args = arguments(&args)?;
        let table_name = required_str(args, "table_name")?;
        let depth = depth_arg(args)?;
        let request = self.ctx.lineage_request(table_name, depth);
        fetch_lineage(self.ctx.transport.as_ref(), &self.ctx.config.lineage_database, &request).await
    }
}

/// Searches for tables by measure and report terms.
pub struct CandidateTablesTool {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl ToolDefinition for CandidateTablesTool {
    fn name(&self) -> &str {
        "findCandidateTableNames"
    }

    fn display_name(&self) -> &str {
        "Find Candidate Tables related to Measure and Report search terms"
    }

    fn description(&self) -> &str {
        "Given a search term for both a measure and a report, return potential source tables along with whether they are built in Airflow or Retool. Both terms are parsed with the PostgreSQL function `websearch_to_tsquery`. If either term is missing or empty, the result is empty."
    }

    fn parameters(&self) -> Value {
        json!({
            "$schema": SCHEMA_DRAFT,
            "type": "object",
            "properties": {
                "measure_search_term": {
                    "type": "string",
                    "description": "A whole or partial name of a measure whose table is sought. Cannot be empty."
                },
                "report_search_term": {
                    "type": "string",
                    "description": "A whole or partial name of the report the measure belongs to. Cannot be empty."
                }
            },
            "required": ["measure_search_term", "report_search_term"]
        })
    }

    fn format_message(&self, args: &Value) -> String {
        let term = |key: &str| args.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        format!(
            "Searching for tables that may contain {} within a table responsible for {}...",
            term("measure_search_term"),
            term("report_search_term")
        )
    }

    async fn call(&self, args: Value) -> AppResult<Value> {
        let args = arguments(&args)?;
        find_candidate_tables(
            self.ctx.transport.as_ref(),
            &self.ctx.config.lineage_database,
            optional_str(args, "measure_search_term"),
            optional_str(args, "report_search_term"),
        )
        .await
    }
}

/// Signs a download URL for a blob.
pub struct BlobUrlTool {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl ToolDefinition for BlobUrlTool {
    fn name(&self) -> &str {
        "getAzureBlobUrl"
    }

    fn display_name(&self) -> &str {
        "Get Azure Blob URL"
    }

    fn description(&self) -> &str {
        "Given a blob prefix, return a SAS secured URL that allows the file at that blob to be downloaded. The container is fixed and cannot be changed."
    }

    fn parameters(&self) -> Value {
        json!({
            "$schema": SCHEMA_DRAFT,
            "type": "object",
            "properties": {
                "blobName": {
                    "type": "string",
                    "description": "The blob prefix at which the file is located."
                }
            },
            "required": ["blobName"]
        })
    }

    fn format_message(&self, args: &Value) -> String {
        match args.get("blobName").and_then(Value::as_str) {
            Some(b) if !b.is_empty() => "Resolving blob URL...".into(),
            _ => String::new(),
        }
    }

    async fn call(&self, args: Value) -> AppResult<Value> {
        let args = arguments(&args)?;
        let blob_name = required_str(args, "blobName")?;
        let url = resolve_blob_url(self.ctx.endpoint.as_ref(), blob_name).await?;
        Ok(Value::String(url))
    }
}

/// Resolves a location name to the weather provider's key.
pub struct LocationKeyTool {
    ctx: Arc<ToolContext>,
}

#[async_trait]
impl ToolDefinition for LocationKeyTool {
    fn name(&self) -> &str {
        "getLocationKey"
    }

    fn display_name(&self) -> &str {
        "Get Location Key"
    }

    fn description(&self) -> &str {
        "Resolve a location name to the weather provider's location key. Uses the preferred location from the settings when none is given."
    }

    fn parameters(&self) -> Value {
        json!({
            "$schema": SCHEMA_DRAFT,
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City or place name."
                }
            },
            "required": []
        })
    }

    async fn call(&self, args: Value) -> AppResult<Value> {
        let resolver = self
            .ctx
            .location
            .as_ref()
            .ok_or_else(|| AppError::Misconfigured("location endpoint is not set".into()))?;

        let given = args
            .get("location")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let location = match given {
            Some(location) => location,
            None => self.ctx.settings.read().await.settings().preferred_location.clone(),
        };

        let key = resolver.resolve(&location).await?;
        Ok(json!({ "location": location, "key": key }))
    }
}
