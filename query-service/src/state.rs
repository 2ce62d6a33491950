//! Application state for query service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::pool_manager::PoolManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pools: Arc<PoolManager>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            pools: Arc::new(PoolManager::from_env(config.clone())),
            config,
        }
    }
}
