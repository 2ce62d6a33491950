//! Tool and slash-command descriptors exchanged with the host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Function-calling declaration of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// JSON schema (draft-04) of the arguments object.
    #[schema(value_type = Object)]
    pub parameters: Value,
}

/// Type accepted by a command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
    Number,
}

/// A slash-command argument. Unnamed arguments have no `name`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub description: String,
    pub is_required: bool,
    pub type_list: Vec<ArgumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ArgumentSpec {
    /// Required unnamed string argument.
    pub fn unnamed(description: impl Into<String>) -> Self {
        Self {
            name: None,
            description: description.into(),
            is_required: true,
            type_list: vec![ArgumentType::String],
            default_value: None,
        }
    }

    /// Named argument of the given type.
    pub fn named(name: impl Into<String>, description: impl Into<String>, ty: ArgumentType) -> Self {
        Self {
            name: Some(name.into()),
            description: description.into(),
            is_required: false,
            type_list: vec![ty],
            default_value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Slash-command declaration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub name: String,
    pub help_string: String,
    pub returns: String,
    pub unnamed_argument_list: Vec<ArgumentSpec>,
    pub named_argument_list: Vec<ArgumentSpec>,
}

/// Result of a tool call as reported to the host.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolInvocation {
    /// Progress line shown while the tool runs.
    pub message: String,
    #[schema(value_type = Object)]
    pub result: Value,
}

/// Parsed slash-command input: the unnamed value plus `key=value` pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CommandInvocation {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub args: HashMap<String, String>,
}
