//! Core of the SQL tools.
//!
//! Builds parameterized statements for table lineage, candidate-table
//! search and conversation logging, runs them through a [`QueryTransport`],
//! and formats the rows for people or for an LLM. Tools and slash commands
//! reach a host only through the [`Registrar`] capability.

pub mod blob;
pub mod cache;
pub mod commands;
pub mod context;
pub mod conversation;
pub mod format;
pub mod lineage;
pub mod location;
pub mod registry;
pub mod search;
pub mod tools;
pub mod transport;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use common::errors::AppResult;

pub use context::ToolContext;
pub use lineage::{LineageRequest, RelationSource};
pub use registry::{Registrar, SlashCommand, ToolDefinition, ToolRegistry};
pub use transport::{DirectTransport, HttpTransport, JsonEndpoint, QueryTransport};

/// Registers every built-in function tool and slash command.
pub async fn register_builtin(registrar: &dyn Registrar, ctx: Arc<ToolContext>) -> AppResult<()> {
    for tool in tools::builtin_tools(ctx.clone()) {
        registrar.register_tool(tool).await?;
    }
    for command in commands::builtin_commands(ctx) {
        registrar.register_command(command).await?;
    }
    Ok(())
}
