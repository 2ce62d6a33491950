//! Tool and slash-command registration.
//!
//! The core never assumes how a host dispatches calls: it hands
//! [`ToolDefinition`]s and [`SlashCommand`]s to whatever implements
//! [`Registrar`]. [`ToolRegistry`] is the in-memory host used by the
//! gateway and the tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use common::errors::{AppError, AppResult};
use common::models::{CommandSpec, ToolInvocation, ToolSpec};

/// A function-calling tool.
#[async_trait]
pub trait ToolDefinition: Send + Sync {
    /// Name the LLM calls the tool by.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Progress line shown while the call runs. Empty means nothing to show.
    fn format_message(&self, _args: &Value) -> String {
        String::new()
    }

    /// Executes the tool.
    async fn call(&self, args: Value) -> AppResult<Value>;

    /// Declaration handed to the function-calling layer.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            display_name: self.display_name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// A slash command: one unnamed value plus named `key=value` arguments.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    fn spec(&self) -> CommandSpec;

    async fn call(&self, args: &HashMap<String, String>, value: &str) -> AppResult<String>;
}

/// What the core needs from a host.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register_tool(&self, tool: Arc<dyn ToolDefinition>) -> AppResult<()>;

    async fn register_command(&self, command: Arc<dyn SlashCommand>) -> AppResult<()>;
}

/// In-memory registry of tools and commands.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn ToolDefinition>>>,
    commands: RwLock<HashMap<String, Arc<dyn SlashCommand>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a tool by name.
    pub async fn get_tool(&self, name: &str) -> AppResult<Arc<dyn ToolDefinition>> {
        self.tools
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::ToolNotFound(name.to_string()))
    }

    /// Gets a command by name.
    pub async fn get_command(&self, name: &str) -> AppResult<Arc<dyn SlashCommand>> {
        self.commands
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::CommandNotFound(name.to_string()))
    }

    /// Declarations of every tool, sorted by name.
    pub async fn tool_specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.read().await.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Declarations of every command, sorted by name.
    pub async fn command_specs(&self) -> Vec<CommandSpec> {
        let mut specs: Vec<CommandSpec> = self.commands.read().await.values().map(|c| c.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Calls a tool by name.
    pub async fn call_tool(&self, name: &str, args: Value) -> AppResult<ToolInvocation> {
        let tool = self.get_tool(name).await?;
        let message = tool.format_message(&args);
        tracing::info!(tool = name, "Calling tool");
        let result = tool.call(args).await.inspect_err(|e| {
            tracing::warn!(tool = name, error = %e, "Tool call failed");
        })?;
        Ok(ToolInvocation { message, result })
    }

    /// Calls a slash command by name.
    pub async fn call_command(&self, name: &str, args: &HashMap<String, String>, value: &str) -> AppResult<String> {
        let command = self.get_command(name).await?;
        tracing::info!(command = name, "Running slash command");
        command.call(args, value).await.inspect_err(|e| {
            tracing::warn!(command = name, error = %e, "Slash command failed");
        })
    }
}

#[async_trait]
impl Registrar for ToolRegistry {
    async fn register_tool(&self, tool: Arc<dyn ToolDefinition>) -> AppResult<()> {
        let name = tool.name().to_string();
        let mut tools = self.tools.write().await;
        if tools.contains_key(&name) {
            return Err(AppError::ToolAlreadyExists(name));
        }
        tracing::debug!(tool = %name, "Tool registered");
        tools.insert(name, tool);
        Ok(())
    }

    async fn register_command(&self, command: Arc<dyn SlashCommand>) -> AppResult<()> {
        let name = command.spec().name;
        let mut commands = self.commands.write().await;
        if commands.contains_key(&name) {
            return Err(AppError::ToolAlreadyExists(name));
        }
        tracing::debug!(command = %name, "Slash command registered");
        commands.insert(name, command);
        Ok(())
    }
}
