//! Application state for the tool host.

use std::sync::Arc;

use tokio::sync::RwLock;

use common::config::AppConfig;
use common::settings::SettingsStore;
use sql_tools::ToolRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<ToolRegistry>,
    /// Also held by the tool context, so edits reach the direct transport.
    pub settings: Arc<RwLock<SettingsStore>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig, registry: Arc<ToolRegistry>, settings: Arc<RwLock<SettingsStore>>) -> Self {
        Self {
            config,
            registry,
            settings,
        }
    }
}
