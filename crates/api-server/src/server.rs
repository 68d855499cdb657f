//! API server: wires the stores into the REST, management and admin
//! routers and serves them alongside the Prometheus exporter.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use crate::{analytics_rest, dashboard_rest, upload_rest};
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use pulse_admin_console::{admin_router, AdminState, UserOps};
use pulse_analytics::{AggregationEngine, MetricStore};
use pulse_core::config::AppConfig;
use pulse_ingest::IngestionPipeline;
use pulse_management::auth::require_auth;
use pulse_management::{management_router, DirectoryStore, ManagementState, PasswordHasher, SessionRegistry};
use pulse_reporting::ReportingFacade;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Main API token prefix.
pub const APP_TOKEN_PREFIX: &str = "mp_";
/// Admin console token prefix.
pub const ADMIN_TOKEN_PREFIX: &str = "mpa_";

/// Long-lived collaborators shared by every router.
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub metric_store: Arc<dyn MetricStore>,
    pub directory: Arc<DirectoryStore>,
    pub hasher: PasswordHasher,
    pub sessions: Arc<SessionRegistry>,
    pub admin_sessions: Arc<SessionRegistry>,
}

impl Services {
    pub fn new(config: AppConfig, metric_store: Arc<dyn MetricStore>) -> Self {
        let sessions = Arc::new(SessionRegistry::new(APP_TOKEN_PREFIX, config.auth.token_ttl_hours));
        let admin_sessions = Arc::new(SessionRegistry::new(
            ADMIN_TOKEN_PREFIX,
            config.admin.session_ttl_hours,
        ));
        Self {
            config,
            metric_store,
            directory: Arc::new(DirectoryStore::new()),
            hasher: PasswordHasher::new(),
            sessions,
            admin_sessions,
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }
}

pub struct ApiServer {
    services: Services,
}

impl ApiServer {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Build the full application router.
    pub fn router(&self) -> Router {
        let s = &self.services;
        let engine = Arc::new(AggregationEngine::new(s.metric_store.clone(), &s.config.analytics));
        let state = AppState {
            reporting: Arc::new(ReportingFacade::new(engine, s.directory.clone())),
            pipeline: Arc::new(IngestionPipeline::new(
                s.metric_store.clone(),
                s.config.ingest.clone(),
            )),
            start_time: Instant::now(),
        };
        let body_limit = s.config.ingest.max_upload_bytes + upload_rest::MULTIPART_OVERHEAD;

        let operations = Router::new()
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness));

        let reporting = Router::new()
            .route(
                "/api/upload/excel",
                post(upload_rest::upload_excel).layer(DefaultBodyLimit::max(body_limit)),
            )
            .route("/api/upload/summary", get(upload_rest::upload_summary))
            .route("/api/analytics", get(analytics_rest::records))
            .route("/api/analytics/summary", get(analytics_rest::summary))
            .route("/api/analytics/detailed", get(analytics_rest::detailed))
            .route("/api/dashboard", get(dashboard_rest::dashboard))
            .route("/api/admin-dashboard", get(dashboard_rest::admin_dashboard))
            .route_layer(middleware::from_fn_with_state(s.sessions.clone(), require_auth));

        let management = management_router(ManagementState {
            directory: s.directory.clone(),
            hasher: s.hasher.clone(),
            sessions: s.sessions.clone(),
        });

        let mut app = operations
            .merge(reporting)
            .with_state(state)
            .merge(management)
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

        if s.config.admin.enabled {
            let admin = admin_router(AdminState {
                directory: s.directory.clone(),
                metric_store: s.metric_store.clone(),
                hasher: s.hasher.clone(),
                sessions: s.admin_sessions.clone(),
                users: Arc::new(UserOps::new(
                    s.directory.clone(),
                    s.hasher.clone(),
                    s.sessions.clone(),
                )),
            });
            app = app.nest("/admin/api", admin);
        } else {
            info!("Admin console disabled");
        }

        app.layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::new(
            self.services.config.api.host.parse()?,
            self.services.config.api.http_port,
        );

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Install the Prometheus recorder and serve it on its own port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let config = &self.services.config;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(config.api.host.parse()?, config.metrics.port))
            .install()?;

        info!(port = config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
