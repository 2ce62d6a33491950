//! Shared data models for the tools, the host and the query back-end.

pub mod lineage;
pub mod query;
pub mod tool;

// Re-export commonly used types
pub use lineage::{CandidateTable, LineageRow};
pub use query::{BlobUrlRequest, BlobUrlResponse, QueryPayload, SqlStatement};
pub use tool::{ArgumentSpec, ArgumentType, CommandInvocation, CommandSpec, ToolInvocation, ToolSpec};
