//! Test doubles shared by the tool and command tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};

use common::config::ToolsConfig;
use common::errors::AppResult;
use common::models::SqlStatement;
use common::settings::SettingsStore;

use crate::context::ToolContext;
use crate::transport::{JsonEndpoint, QueryTransport};

/// Answers every statement with the same rows and records what it saw.
pub struct FakeTransport {
    pub rows: Value,
    pub seen: Mutex<Vec<(String, SqlStatement)>>,
}

impl FakeTransport {
    pub fn returning(rows: Value) -> Arc<Self> {
        Arc::new(Self {
            rows,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub async fn calls(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn last(&self) -> (String, SqlStatement) {
        self.seen.lock().await.last().cloned().expect("no statement recorded")
    }
}

#[async_trait]
impl QueryTransport for FakeTransport {
    async fn query(&self, database: &str, statement: &SqlStatement) -> AppResult<Value> {
        self.seen.lock().await.push((database.to_string(), statement.clone()));
        Ok(self.rows.clone())
    }
}

/// Signs every blob as `https://blob/<name>`.
pub struct FakeEndpoint;

#[async_trait]
impl JsonEndpoint for FakeEndpoint {
    async fn post_json(&self, _endpoint: &str, body: Value) -> AppResult<Value> {
        let name = body["blobName"].as_str().unwrap_or_default().to_string();
        Ok(json!({ "blob_url": format!("https://blob/{name}") }))
    }
}

pub fn context(transport: Arc<FakeTransport>) -> Arc<ToolContext> {
    let settings = SettingsStore::from_document("test-settings.json".into(), Default::default());
    Arc::new(ToolContext::new(
        transport,
        Arc::new(FakeEndpoint),
        ToolsConfig::default(),
        Arc::new(RwLock::new(settings)),
    ))
}

pub fn named(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
