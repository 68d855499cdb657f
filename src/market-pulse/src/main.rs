//! MarketPulse: marketing performance dashboard backend.
//!
//! Main entry point that loads configuration, picks the metric store and
//! starts the server.

use clap::{Parser, ValueEnum};
use pulse_admin_console::ensure_bootstrap_admin;
use pulse_analytics::clickhouse_store::ClickHouseMetricStore;
use pulse_analytics::{InMemoryMetricStore, MetricStore};
use pulse_api::{ApiServer, Services};
use pulse_core::config::{AppConfig, StoreBackend};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "market-pulse")]
#[command(about = "Marketing performance dashboard backend")]
#[command(version)]
struct Cli {
    /// Bind address (overrides config)
    #[arg(long, env = "MARKET_PULSE__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "MARKET_PULSE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Prometheus exporter port (overrides config)
    #[arg(long, env = "MARKET_PULSE__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Metric record backend (overrides config)
    #[arg(long, value_enum)]
    store: Option<StoreArg>,

    /// Serve without the admin console
    #[arg(long, default_value_t = false)]
    no_admin: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreArg {
    Memory,
    Clickhouse,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreBackend::Memory,
            StoreArg::Clickhouse => StoreBackend::Clickhouse,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_pulse=info,pulse_api=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("MarketPulse starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(store) = cli.store {
        config.store.backend = store.into();
    }
    if cli.no_admin {
        config.admin.enabled = false;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        store = ?config.store.backend,
        admin_console = config.admin.enabled,
        "Configuration loaded"
    );

    let metric_store: Arc<dyn MetricStore> = match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory metric store; records are lost on restart");
            Arc::new(InMemoryMetricStore::new())
        }
        StoreBackend::Clickhouse => Arc::new(ClickHouseMetricStore::new(&config.store.clickhouse).await?),
    };

    let services = Services::new(config.clone(), metric_store);
    if config.admin.enabled {
        if let Some(admin) =
            ensure_bootstrap_admin(&services.directory, &services.hasher, &config.admin).await?
        {
            info!(user_id = %admin.id, email = %admin.email, "Bootstrap admin ready");
        }
    }

    let api_server = ApiServer::new(services.clone());

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Spawn session maintenance task
    let sessions = services.sessions.clone();
    let admin_sessions = services.admin_sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired() + admin_sessions.purge_expired();
            if purged > 0 {
                info!(purged, "Expired sessions purged");
            }
        }
    });

    info!("MarketPulse is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
