//! Admin console REST handlers. All routes except `login` require an admin
//! console session.

use crate::user_ops::{CreateUserRequest, UpdateUserRequest, UserOps};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use chrono::NaiveDate;
use pulse_analytics::MetricStore;
use pulse_core::types::{Campaign, CampaignBreakdown, Client, MetricRecord, MetricValues, User};
use pulse_core::{DateRange, Principal, PulseError};
use pulse_management::auth::bearer_token;
use pulse_management::error::{ApiResult, AppJson};
use pulse_management::handlers::verify_credentials;
use pulse_management::models::{LoginRequest, LoginResponse};
use pulse_management::{DirectoryStore, PasswordHasher, SessionRegistry};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AdminState {
    pub directory: Arc<DirectoryStore>,
    pub metric_store: Arc<dyn MetricStore>,
    pub hasher: PasswordHasher,
    /// Admin console sessions, separate from the main API's.
    pub sessions: Arc<SessionRegistry>,
    pub users: Arc<UserOps>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub metrics: MetricValues,
    #[serde(default)]
    pub campaigns: Vec<CampaignBreakdown>,
}

// ─── Session ───────────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<AdminState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = verify_credentials(&state.directory, &state.hasher, &req).await?;
    if user.role != pulse_core::Role::Admin {
        metrics::counter!("admin.logins.denied").increment(1);
        warn!(user_id = %user.id, "Non-admin attempted admin console login");
        return Err(PulseError::Forbidden("admin role required".into()).into());
    }
    let (token, expires_at) = state.sessions.issue(user.id, user.role);
    info!(user_id = %user.id, "Admin console login");
    Ok(Json(LoginResponse {
        token,
        user,
        expires_at,
    }))
}

pub async fn logout(State(state): State<AdminState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    StatusCode::NO_CONTENT
}

// ─── Users ─────────────────────────────────────────────────────────────────

pub async fn list_users(State(state): State<AdminState>) -> Json<Vec<User>> {
    Json(state.users.list())
}

pub async fn create_user(
    State(state): State<AdminState>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let credentials_changed = req.role.is_some() || req.password.is_some();
    let user = state.users.update(id, req).await?;
    if credentials_changed {
        state.sessions.revoke_user(id);
    }
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AdminState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = state.users.delete(id, admin.id)?;
    state.sessions.revoke_user(id);
    Ok(Json(user))
}

// ─── Campaigns & clients ───────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<AdminState>) -> Json<Vec<Campaign>> {
    Json(state.directory.all_campaigns())
}

pub async fn delete_campaign(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    let campaign = state
        .directory
        .remove_campaign(id)
        .ok_or_else(|| PulseError::NotFound(format!("campaign {id}")))?;
    metrics::counter!("admin.campaigns.deleted").increment(1);
    Ok(Json(campaign))
}

pub async fn list_clients(State(state): State<AdminState>) -> Json<Vec<Client>> {
    Json(state.directory.all_clients())
}

pub async fn delete_client(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Client>> {
    let client = state
        .directory
        .remove_client(id)
        .ok_or_else(|| PulseError::NotFound(format!("client {id}")))?;
    metrics::counter!("admin.clients.deleted").increment(1);
    Ok(Json(client))
}

// ─── Metric records ────────────────────────────────────────────────────────

pub async fn list_records(
    State(state): State<AdminState>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Json<Vec<MetricRecord>>> {
    let range = DateRange::new(query.start_date, query.end_date);
    Ok(Json(state.metric_store.find_in_range(range).await?))
}

pub async fn create_record(
    State(state): State<AdminState>,
    AppJson(req): AppJson<CreateRecordRequest>,
) -> ApiResult<(StatusCode, Json<MetricRecord>)> {
    let record = MetricRecord::new(req.date, req.metrics, req.campaigns);
    state.metric_store.insert_many(vec![record.clone()]).await?;
    metrics::counter!("admin.records.created").increment(1);
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_record(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.metric_store.delete(id).await? {
        metrics::counter!("admin.records.deleted").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(PulseError::NotFound(format!("metric record {id}")).into())
    }
}
