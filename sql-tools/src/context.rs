//! Shared state handed to every tool and command.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use common::config::{AppConfig, ToolsConfig, TransportKind};
use common::errors::AppResult;
use common::settings::SettingsStore;

use crate::lineage::LineageRequest;
use crate::location::{HttpLocationProvider, LocationResolver};
use crate::transport::{DirectTransport, HttpTransport, JsonEndpoint, QueryTransport};

/// Transports, configuration and settings used by the built-in tools.
pub struct ToolContext {
    pub transport: Arc<dyn QueryTransport>,
    pub endpoint: Arc<dyn JsonEndpoint>,
    pub config: ToolsConfig,
    pub settings: Arc<RwLock<SettingsStore>>,
    pub location: Option<Arc<LocationResolver>>,
}

impl ToolContext {
    pub fn new(
        transport: Arc<dyn QueryTransport>,
        endpoint: Arc<dyn JsonEndpoint>,
        config: ToolsConfig,
        settings: Arc<RwLock<SettingsStore>>,
    ) -> Self {
        Self {
            transport,
            endpoint,
            config,
            settings,
            location: None,
        }
    }

    pub fn with_location(mut self, resolver: Arc<LocationResolver>) -> Self {
        self.location = Some(resolver);
        self
    }

    /// Wires the transports selected by the configuration.
    pub fn from_config(
        app: &AppConfig,
        config: ToolsConfig,
        settings: Arc<RwLock<SettingsStore>>,
    ) -> AppResult<Self> {
        let http = HttpTransport::new(config.clone(), Duration::from_secs(app.http_timeout_secs))?;
        let transport: Arc<dyn QueryTransport> = match config.transport {
            TransportKind::Http => Arc::new(http.clone()),
            TransportKind::Direct => Arc::new(DirectTransport::new(
                settings.clone(),
                Duration::from_secs(app.connect_timeout_secs),
            )),
        };
        tracing::info!(transport = ?config.transport, "Query transport selected");

        let location = config.location_endpoint.as_ref().map(|endpoint| {
            let provider = HttpLocationProvider::new(reqwest::Client::new(), endpoint.clone(), settings.clone());
            let resolver = LocationResolver::new(Arc::new(provider), config.location_cache_capacity);
            Arc::new(match config.location_cache_ttl_secs {
                Some(secs) => resolver.with_ttl(Duration::from_secs(secs)),
                None => resolver,
            })
        });

        let signer = http.clone().pointing_at(&config.blob_service_url);
        tracing::info!(url = %config.blob_service_url, "Blob signing endpoint selected");

        let mut ctx = Self::new(transport, Arc::new(signer), config, settings);
        ctx.location = location;
        Ok(ctx)
    }

    /// Lineage request carrying the configured provenance filter and row cap.
    pub fn lineage_request(&self, table_name: &str, depth: u32) -> LineageRequest {
        LineageRequest::new(table_name)
            .depth(depth)
            .source_filter(self.config.lineage_source_filter.clone())
            .limit(self.config.lineage_row_limit)
    }
}
