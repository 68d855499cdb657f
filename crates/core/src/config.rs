use crate::types::GroupingStrategy;
use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `MARKET_PULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Clickhouse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default)]
    pub clickhouse: ClickHouseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickHouseConfig {
    #[serde(default = "default_clickhouse_url")]
    pub url: String,
    #[serde(default = "default_clickhouse_db")]
    pub database: String,
    #[serde(default = "default_clickhouse_table")]
    pub table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// chrono format string applied to textual date cells.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,
    #[serde(default)]
    pub grouping: GroupingStrategy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_enabled")]
    pub enabled: bool,
    #[serde(default = "default_admin_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Seed admin account created at startup when absent. There is no
    /// built-in fallback credential.
    #[serde(default)]
    pub bootstrap_email: Option<String>,
    #[serde(default)]
    pub bootstrap_password: Option<String>,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    5000
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_store_backend() -> StoreBackend {
    StoreBackend::Memory
}
fn default_clickhouse_url() -> String {
    "http://localhost:8123".to_string()
}
fn default_clickhouse_db() -> String {
    "market_pulse".to_string()
}
fn default_clickhouse_table() -> String {
    "metric_records".to_string()
}
fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}
fn default_date_format() -> String {
    "%d-%m-%Y".to_string()
}
fn default_window_days() -> i64 {
    30
}
fn default_token_ttl_hours() -> i64 {
    24
}
fn default_admin_enabled() -> bool {
    true
}
fn default_admin_session_ttl_hours() -> i64 {
    8
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: default_clickhouse_url(),
            database: default_clickhouse_db(),
            table: default_clickhouse_table(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            date_format: default_date_format(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            grouping: GroupingStrategy::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: default_admin_enabled(),
            session_ttl_hours: default_admin_session_ttl_hours(),
            bootstrap_email: None,
            bootstrap_password: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
            analytics: AnalyticsConfig::default(),
            auth: AuthConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("MARKET_PULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_upload_contract() {
        let config = AppConfig::default();
        assert_eq!(config.ingest.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.ingest.date_format, "%d-%m-%Y");
        assert_eq!(config.analytics.default_window_days, 30);
        assert_eq!(config.analytics.grouping, GroupingStrategy::YearAgnostic);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.admin.bootstrap_email.is_none());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "store": { "backend": "clickhouse" },
            "analytics": { "grouping": "year_qualified" }
        }))
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Clickhouse);
        assert_eq!(config.store.clickhouse.table, "metric_records");
        assert_eq!(config.analytics.grouping, GroupingStrategy::YearQualified);
        assert_eq!(config.api.http_port, 5000);
    }
}
