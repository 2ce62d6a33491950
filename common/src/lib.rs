//! Shared building blocks for the SQL tools workspace.
//!
//! Holds the error taxonomy, configuration and persisted settings, the
//! wire models shared by the tool host and the query back-end, the API
//! response envelope, HTTP middleware, service start-up and SQL utilities.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod server;
pub mod settings;
pub mod utils;
