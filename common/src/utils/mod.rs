//! Utility functions and helpers.

pub mod json_rows;
pub mod sql_validator;

// Re-export commonly used types
pub use json_rows::{bind_json_args, fetch_json_rows};
pub use sql_validator::SqlValidator;
