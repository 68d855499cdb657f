//! Dashboard screens.

use crate::rest::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use pulse_core::Principal;
use pulse_management::ApiResult;
use pulse_reporting::payloads::{AdminOverviewPayload, DashboardPayload};

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses((status = 200, description = "Caller's dashboard over the last 30 days", body = DashboardPayload))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<DashboardPayload>> {
    Ok(Json(state.reporting.dashboard(&principal).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin-dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Organisation-wide overview", body = AdminOverviewPayload),
        (status = 403, description = "Caller is not an admin", body = pulse_management::models::ErrorResponse),
    )
)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<AdminOverviewPayload>> {
    Ok(Json(state.reporting.admin_overview(&principal).await?))
}
