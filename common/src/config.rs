//! Environment-driven configuration.
//!
//! Services call [`load_dotenv`] first, then [`AppConfig::load_with_service`]
//! for the listener/pool settings and [`ToolsConfig::load`] for the tool
//! endpoints and query defaults.

use std::path::PathBuf;
use std::str::FromStr;

/// Reads an environment variable and parses it, falling back to `default`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Loads `.env` from the working directory (best-effort, no error if missing).
///
/// Variables already present in the environment win over the file.
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    let Ok(content) = std::fs::read_to_string(env_path) else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if std::env::var(key).is_err() {
                std::env::set_var(key, value.trim().trim_matches('"'));
            }
        }
    }
}

/// Listener and pool configuration shared by every service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the running service.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port (each service overrides with its own default).
    pub port: u16,
    /// Database connect/acquire timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum connections per pool.
    pub max_connections: u32,
    /// Timeout for outgoing HTTP calls in seconds.
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Loads the configuration for a named service.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: env_string("SERVER_HOST", "0.0.0.0"),
            port: env_or("SERVER_PORT", 8080),
            connect_timeout_secs: env_or("CONNECT_TIMEOUT_SECS", 10),
            max_connections: env_or("MAX_CONNECTIONS", 5),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", 30),
        }
    }
}

/// Which transport the tools use to reach the SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// POST JSON to the query back-end.
    Http,
    /// Connect straight to PostgreSQL with the persisted settings.
    Direct,
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(TransportKind::Http),
            "direct" | "postgres" => Ok(TransportKind::Direct),
            other => Err(format!("unknown transport: {other}")),
        }
    }
}

/// Configuration for the tools: endpoints, logical databases and query defaults.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Base URL of the query back-end.
    pub query_service_url: String,
    /// Path prefix of the plugin endpoints.
    pub plugin_path: String,
    /// Base URL of the service signing blob URLs.
    pub blob_service_url: String,
    /// Logical database holding `frc_sql_code`.
    pub lineage_database: String,
    /// Logical database holding the conversation log.
    pub logging_database: String,
    /// Provenance tag lineage expansion is restricted to (empty disables).
    pub lineage_source_filter: Option<String>,
    /// Row cap for lineage results.
    pub lineage_row_limit: u32,
    /// Location of the persisted settings document.
    pub settings_path: PathBuf,
    /// Transport used by the tools.
    pub transport: TransportKind,
    /// Location search endpoint for the location resolver.
    pub location_endpoint: Option<String>,
    /// Capacity of the location cache.
    pub location_cache_capacity: usize,
    /// Lifetime of a cached location key in seconds (unset or 0 keeps keys).
    pub location_cache_ttl_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            query_service_url: "http://127.0.0.1:8082".to_string(),
            plugin_path: "/api/plugins/postgresql".to_string(),
            blob_service_url: "http://127.0.0.1:8082".to_string(),
            lineage_database: "shannon".to_string(),
            logging_database: "liffey".to_string(),
            lineage_source_filter: Some("Airflow".to_string()),
            lineage_row_limit: 10,
            settings_path: PathBuf::from("settings.json"),
            transport: TransportKind::Http,
            location_endpoint: None,
            location_cache_capacity: 256,
            location_cache_ttl_secs: None,
        }
    }
}

impl ToolsConfig {
    /// Loads the tools configuration from the environment.
    pub fn load() -> Self {
        let defaults = Self::default();
        let lineage_source_filter = match std::env::var("LINEAGE_SOURCE_FILTER") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(v.trim().to_string()),
            Err(_) => defaults.lineage_source_filter,
        };
        let query_service_url = env_string("QUERY_SERVICE_URL", &defaults.query_service_url)
            .trim_end_matches('/')
            .to_string();
        Self {
            blob_service_url: env_string("BLOB_SERVICE_URL", &query_service_url)
                .trim_end_matches('/')
                .to_string(),
            query_service_url,
            plugin_path: env_string("PLUGIN_PATH", &defaults.plugin_path),
            lineage_database: env_string("LINEAGE_DATABASE", &defaults.lineage_database),
            logging_database: env_string("LOGGING_DATABASE", &defaults.logging_database),
            lineage_source_filter,
            lineage_row_limit: env_or("LINEAGE_ROW_LIMIT", defaults.lineage_row_limit),
            settings_path: std::env::var("SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            transport: env_or("QUERY_TRANSPORT", defaults.transport),
            location_endpoint: std::env::var("LOCATION_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            location_cache_capacity: env_or(
                "LOCATION_CACHE_CAPACITY",
                defaults.location_cache_capacity,
            ),
            location_cache_ttl_secs: std::env::var("LOCATION_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0),
        }
    }

    /// URL of a plugin endpoint below the plugin path.
    pub fn plugin_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.query_service_url.trim_end_matches('/'),
            self.plugin_path.trim_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}
