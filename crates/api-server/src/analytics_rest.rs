//! Analytics endpoints: raw records, whole-collection totals and the
//! detailed time series.

use crate::rest::{parse_query_date, AppState};
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use pulse_analytics::aggregate::SalesTotals;
use pulse_core::types::Granularity;
use pulse_core::{DateRange, PulseError, PulseResult};
use pulse_management::ApiResult;
use pulse_reporting::payloads::{DetailedAnalytics, PopulatedRecord};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// `day` (default), `week` or `month`.
    pub group_by: Option<String>,
}

impl AnalyticsQuery {
    /// Missing bounds fall back to the engine's default window.
    fn range(&self, state: &AppState) -> PulseResult<DateRange> {
        let start = parse_query_date("startDate", self.start_date.as_deref())?;
        let end = parse_query_date("endDate", self.end_date.as_deref())?;
        state
            .engine()
            .resolve_range(start, end, Utc::now().date_naive())
    }

    fn granularity(&self) -> PulseResult<Granularity> {
        match self.group_by.as_deref().map(str::trim) {
            None | Some("") => Ok(Granularity::Day),
            Some(raw) => raw.parse().map_err(PulseError::Validation),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/analytics",
    tag = "Analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Records with campaigns and clients populated", body = [PopulatedRecord]),
        (status = 400, description = "Malformed date", body = pulse_management::models::ErrorResponse),
    )
)]
pub async fn records(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<Vec<PopulatedRecord>>> {
    let range = query.range(&state)?;
    Ok(Json(state.reporting.populated_records(range).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "Analytics",
    responses((status = 200, description = "Totals over every record", body = SalesTotals))
)]
pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<SalesTotals>> {
    Ok(Json(state.engine().sales_totals().await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/detailed",
    tag = "Analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Grouped time series, statistics and campaign breakdown", body = DetailedAnalytics),
        (status = 400, description = "Malformed date, inverted range or unknown groupBy", body = pulse_management::models::ErrorResponse),
    )
)]
pub async fn detailed(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<DetailedAnalytics>> {
    let range = query.range(&state)?;
    let granularity = query.granularity()?;
    Ok(Json(state.reporting.detailed(range, granularity).await?))
}
