//! Shared REST state, query parsing helpers and the operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate};
use pulse_analytics::AggregationEngine;
use pulse_core::{PulseError, PulseResult};
use pulse_ingest::IngestionPipeline;
use pulse_reporting::ReportingFacade;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use utoipa::ToSchema;

/// Shared application state for the analytics, upload and dashboard
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub reporting: Arc<ReportingFacade>,
    pub pipeline: Arc<IngestionPipeline>,
    pub start_time: Instant,
}

impl AppState {
    pub fn engine(&self) -> &Arc<AggregationEngine> {
        self.reporting.engine()
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready: 200 once the metric store answers.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Ready to serve"),
        (status = 503, description = "Metric store unreachable"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.engine().store().count().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /live
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Parse an optional `startDate`/`endDate` query value. Accepts `YYYY-MM-DD`
/// or an RFC 3339 timestamp, whose calendar date is used.
pub fn parse_query_date(field: &str, value: Option<&str>) -> PulseResult<Option<NaiveDate>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| Some(ts.date_naive()))
        .map_err(|_| PulseError::Validation(format!("{field} '{raw}' is not a valid date")))
}
