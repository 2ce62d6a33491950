//! Persisted connection settings.
//!
//! Settings live in a JSON document shared with other extensions, one
//! object per extension key:
//!
//! ```json
//! { "sqlquery": { "host": "db.internal", "port": "5432", ... } }
//! ```
//!
//! Loading merges the defaults in key by key, so fields introduced by a
//! newer release show up with their default value while everything already
//! persisted (including keys this release does not know) is left alone.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// Key of this extension's section in the settings document.
pub const EXTENSION_KEY: &str = "sqlquery";

/// Every field the settings section carries, in panel order.
pub const SETTINGS_FIELDS: [&str; 8] = [
    "host",
    "port",
    "user",
    "password",
    "database",
    "apiKey",
    "preferredLocation",
    "units",
];

/// Connection parameters edited through the settings panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    pub host: String,
    pub user: String,
    /// Never echoed back to clients.
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    pub port: String,
    pub api_key: String,
    pub preferred_location: String,
    pub units: String,
}

impl ConnectionSettings {
    fn from_section(section: &Map<String, Value>) -> Self {
        let field = |name: &str| match section.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            host: field("host"),
            user: field("user"),
            password: field("password"),
            database: field("database"),
            port: field("port"),
            api_key: field("apiKey"),
            preferred_location: field("preferredLocation"),
            units: field("units"),
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "host" => Some(&mut self.host),
            "user" => Some(&mut self.user),
            "password" => Some(&mut self.password),
            "database" => Some(&mut self.database),
            "port" => Some(&mut self.port),
            "apiKey" => Some(&mut self.api_key),
            "preferredLocation" => Some(&mut self.preferred_location),
            "units" => Some(&mut self.units),
            _ => None,
        }
    }
}

/// Default value of every settings field.
pub fn default_section() -> Map<String, Value> {
    SETTINGS_FIELDS
        .iter()
        .map(|k| (k.to_string(), Value::String(String::new())))
        .collect()
}

/// Inserts every default key missing from `section`. Existing keys are never
/// overwritten. Returns the keys that were added.
pub fn merge_defaults(section: &mut Map<String, Value>, defaults: &Map<String, Value>) -> Vec<String> {
    let mut added = Vec::new();
    for (key, value) in defaults {
        if !section.contains_key(key) {
            section.insert(key.clone(), value.clone());
            added.push(key.clone());
        }
    }
    added
}

/// File-backed settings with an explicit load / edit / save lifecycle.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    document: Map<String, Value>,
    section: Map<String, Value>,
    settings: ConnectionSettings,
}

impl SettingsStore {
    /// Loads the settings document, creating this extension's section and
    /// merging defaults as needed. A missing file yields pure defaults.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Map::new(),
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(AppError::Settings(format!(
                        "{} does not hold a JSON object",
                        path.display()
                    )))
                }
                Err(e) => {
                    return Err(AppError::Settings(format!(
                        "failed to parse {}: {}",
                        path.display(),
                        e
                    )))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No settings file, using defaults");
                Map::new()
            }
            Err(e) => {
                return Err(AppError::Settings(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self::from_document(path, document))
    }

    /// Builds a store from an already parsed document.
    pub fn from_document(path: PathBuf, document: Map<String, Value>) -> Self {
        let mut section = match document.get(EXTENSION_KEY) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        let added = merge_defaults(&mut section, &default_section());
        if !added.is_empty() {
            tracing::debug!(keys = ?added, "Merged default settings");
        }
        let settings = ConnectionSettings::from_section(&section);
        Self {
            path,
            document,
            section,
            settings,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Raw section as it will be persisted.
    pub fn section(&self) -> &Map<String, Value> {
        &self.section
    }

    /// Location of the settings document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Updates a single field.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> AppResult<()> {
        let value = value.into();
        let slot = self
            .settings
            .field_mut(field)
            .ok_or_else(|| AppError::Validation(format!("unknown settings field: {field}")))?;
        *slot = value.clone();
        self.section.insert(field.to_string(), Value::String(value));
        Ok(())
    }

    /// Writes the document back, leaving other extensions' sections intact.
    pub async fn save(&mut self) -> AppResult<()> {
        self.document
            .insert(EXTENSION_KEY.to_string(), Value::Object(self.section.clone()));
        let body = serde_json::to_string_pretty(&self.document)
            .map_err(|e| AppError::Settings(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Settings(e.to_string()))?;
        }
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| AppError::Settings(format!("failed to write {}: {}", self.path.display(), e)))?;
        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("sqlquery-settings-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_merge_adds_missing_keys_only() {
        let mut section = json!({ "host": "db.internal", "units": "metric" })
            .as_object()
            .cloned()
            .unwrap();
        let added = merge_defaults(&mut section, &default_section());

        assert_eq!(section["host"], "db.internal");
        assert_eq!(section["units"], "metric");
        assert_eq!(section["apiKey"], "");
        assert!(added.contains(&"apiKey".to_string()));
        assert!(!added.contains(&"host".to_string()));
    }

    #[test]
    fn test_unknown_keys_survive_merge() {
        let document = json!({ "sqlquery": { "legacy": true, "port": "6543" } })
            .as_object()
            .cloned()
            .unwrap();
        let store = SettingsStore::from_document(temp_path(), document);

        assert_eq!(store.section()["legacy"], true);
        assert_eq!(store.settings().port, "6543");
        assert_eq!(store.settings().host, "");
    }

    #[test]
    fn test_set_field_rejects_unknown_field() {
        let mut store = SettingsStore::from_document(temp_path(), Map::new());
        assert!(store.set_field("colour", "blue").is_err());
        store.set_field("preferredLocation", "Dublin").unwrap();
        assert_eq!(store.settings().preferred_location, "Dublin");
    }

    #[test]
    fn test_password_is_not_serialized() {
        let settings = ConnectionSettings {
            password: "hunter2".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("apiKey").is_some());
    }

    #[tokio::test]
    async fn test_missing_file_loads_defaults() {
        let store = SettingsStore::load(temp_path()).await.unwrap();
        assert_eq!(store.settings(), &ConnectionSettings::default());
        assert_eq!(store.section().len(), SETTINGS_FIELDS.len());
    }

    #[tokio::test]
    async fn test_save_keeps_other_extensions() {
        let path = temp_path();
        tokio::fs::write(
            &path,
            json!({ "weather": { "apiKey": "k" }, "sqlquery": { "host": "h" } }).to_string(),
        )
        .await
        .unwrap();

        let mut store = SettingsStore::load(&path).await.unwrap();
        store.set_field("user", "analyst").unwrap();
        store.save().await.unwrap();

        let reloaded = SettingsStore::load(&path).await.unwrap();
        assert_eq!(reloaded.settings().host, "h");
        assert_eq!(reloaded.settings().user, "analyst");

        let raw: Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["weather"]["apiKey"], "k");

        let _ = tokio::fs::remove_file(&path).await;
    }
}
