//! Location name to provider key resolution.
//!
//! Weather-style providers address places by an opaque key. Resolving a
//! name costs an upstream call, so keys are cached by the raw input string.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use common::errors::{AppError, AppResult};
use common::settings::SettingsStore;

use crate::cache::LookupCache;

/// Upstream lookup of a provider key.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn resolve_key(&self, location: &str) -> AppResult<String>;
}

/// Resolves locations through a provider, caching the keys.
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    cache: LookupCache<String, String>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>, capacity: usize) -> Self {
        Self {
            provider,
            cache: LookupCache::new(capacity),
        }
    }

    /// Forgets resolved keys `ttl` after they were fetched.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache = self.cache.with_ttl(ttl);
        self
    }

    /// Returns the provider key for `location`.
    pub async fn resolve(&self, location: &str) -> AppResult<String> {
        if location.trim().is_empty() {
            return Err(AppError::MissingArgument("location".into()));
        }
        if let Some(key) = self.cache.get(&location.to_string()).await {
            tracing::debug!(location, "Location key served from cache");
            return Ok(key);
        }
        let key = self.provider.resolve_key(location).await?;
        self.cache.insert(location.to_string(), key.clone()).await;
        Ok(key)
    }

    pub async fn cached(&self) -> usize {
        self.cache.len().await
    }
}

/// Location search over HTTP. The endpoint answers with an array of
/// matches, each carrying its provider key under `Key`.
pub struct HttpLocationProvider {
    client: reqwest::Client,
    endpoint: String,
    settings: Arc<RwLock<SettingsStore>>,
}

impl HttpLocationProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, settings: Arc<RwLock<SettingsStore>>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            settings,
        }
    }
}

#[async_trait]
impl LocationProvider for HttpLocationProvider {
    async fn resolve_key(&self, location: &str) -> AppResult<String> {
        let api_key = self.settings.read().await.settings().api_key.clone();
        if api_key.trim().is_empty() {
            return Err(AppError::Misconfigured("apiKey is not set".into()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("apikey", api_key.as_str()), ("q", location)])
            .send()
            .await
            .map_err(|e| AppError::TransportFailure(format!("location search failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::TransportFailure(format!(
                "location search returned {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(e.to_string()))?;

        first_key(&body).ok_or_else(|| AppError::MalformedResponse(format!("no location matches {location:?}")))
    }
}

fn first_key(body: &Value) -> Option<String> {
    let first = body.as_array()?.first()?;
    match first.get("Key")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
