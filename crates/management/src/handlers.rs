//! Axum REST handlers for accounts, campaigns, clients and settings.
//!
//! Every handler below `register`/`login` runs behind [`crate::auth::require_auth`]
//! and reads the caller from the `Principal` extension.

use crate::auth::{self, bearer_token, PasswordHasher, SessionRegistry};
use crate::error::{ApiError, ApiResult, AppJson};
use crate::models::*;
use crate::store::{DirectoryStore, NewUser};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use pulse_core::types::{Campaign, Client, User, UserSettings};
use pulse_core::{Principal, PulseError, Role};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub directory: Arc<DirectoryStore>,
    pub hasher: PasswordHasher,
    pub sessions: Arc<SessionRegistry>,
}

// ─── Auth ──────────────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = LoginResponse),
        (status = 400, description = "Duplicate email or weak password", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<ManagementState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    auth::validate_password(&req.password)?;
    if state.directory.find_user_by_email(&req.email).is_some() {
        return Err(PulseError::Validation("email is already registered".into()).into());
    }

    let password_hash = state.hasher.hash(req.password).await?;
    let user = state.directory.create_user(NewUser {
        email: req.email,
        password_hash,
        role: Role::User,
        first_name: req.first_name,
        last_name: req.last_name,
    })?;
    let (token, expires_at) = state.sessions.issue(user.id, user.role);

    metrics::counter!("management.users.registered").increment(1);
    info!(user_id = %user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            user,
            expires_at,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<ManagementState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = verify_credentials(&state.directory, &state.hasher, &req).await?;
    let (token, expires_at) = state.sessions.issue(user.id, user.role);
    metrics::counter!("management.logins").increment(1);
    Ok(Json(LoginResponse {
        token,
        user,
        expires_at,
    }))
}

/// Check an email/password pair. Unknown email and wrong password fail the
/// same way.
pub async fn verify_credentials(
    directory: &DirectoryStore,
    hasher: &PasswordHasher,
    req: &LoginRequest,
) -> Result<User, ApiError> {
    let invalid = || ApiError(PulseError::Unauthorized("Invalid credentials".into()));
    let user = directory.find_user_by_email(&req.email).ok_or_else(invalid)?;
    if !hasher
        .verify(req.password.clone(), user.password_hash.clone())
        .await?
    {
        metrics::counter!("management.logins.failed").increment(1);
        return Err(invalid());
    }
    Ok(user)
}

pub async fn logout(State(state): State<ManagementState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    StatusCode::NO_CONTENT
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    responses((status = 200, description = "Caller's campaigns with client populated", body = [CampaignView]))
)]
pub async fn list_campaigns(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
) -> Json<Vec<CampaignView>> {
    Json(state.directory.campaign_views_for_owner(principal.id))
}

#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "Campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created", body = Campaign),
        (status = 400, description = "Missing fields or unknown client", body = ErrorResponse),
    )
)]
pub async fn create_campaign(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let campaign = state.directory.create_campaign(req, principal.id)?;
    metrics::counter!("management.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[utoipa::path(
    patch,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = Campaign),
        (status = 400, description = "Field outside the updatable set", body = ErrorResponse),
        (status = 404, description = "No such campaign owned by the caller", body = ErrorResponse),
    )
)]
pub async fn update_campaign(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<UpdateCampaignRequest>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.directory.update_campaign(id, principal.id, req)?))
}

#[utoipa::path(
    delete,
    path = "/api/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Deleted campaign", body = Campaign),
        (status = 404, description = "No such campaign owned by the caller", body = ErrorResponse),
    )
)]
pub async fn delete_campaign(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    let campaign = state.directory.delete_campaign(id, principal.id)?;
    metrics::counter!("management.campaigns.deleted").increment(1);
    Ok(Json(campaign))
}

// ─── Clients ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/clients/dashboard",
    tag = "Clients",
    responses((status = 200, description = "Caller's clients with totals", body = ClientDashboard))
)]
pub async fn client_dashboard(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
) -> Json<ClientDashboard> {
    Json(state.directory.client_dashboard(principal.id))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client with campaigns populated", body = ClientView),
        (status = 404, description = "No such client managed by the caller", body = ErrorResponse),
    )
)]
pub async fn get_client(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClientView>> {
    Ok(Json(state.directory.client_detail(id, principal.id)?))
}

#[utoipa::path(
    patch,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 404, description = "No such client managed by the caller", body = ErrorResponse),
    )
)]
pub async fn update_client(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    AppJson(req): AppJson<UpdateClientRequest>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.directory.update_client(id, principal.id, req)?))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Missing fields", body = ErrorResponse),
    )
)]
pub async fn create_client(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let client = state.directory.create_client(req, principal.id)?;
    metrics::counter!("management.clients.created").increment(1);
    Ok((StatusCode::CREATED, Json(client)))
}

// ─── Settings ──────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/settings/profile",
    tag = "Settings",
    responses((status = 200, description = "Caller's profile", body = User))
)]
pub async fn get_profile(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<User>> {
    state
        .directory
        .get_user(principal.id)
        .map(Json)
        .ok_or_else(|| PulseError::NotFound(format!("user {}", principal.id)).into())
}

#[utoipa::path(
    patch,
    path = "/api/settings/profile",
    tag = "Settings",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Field outside the updatable set or email taken", body = ErrorResponse),
    )
)]
pub async fn update_profile(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.directory.update_profile(principal.id, req)?))
}

#[utoipa::path(
    patch,
    path = "/api/settings/preferences",
    tag = "Settings",
    request_body = UpdatePreferencesRequest,
    responses((status = 200, description = "Merged preferences", body = UserSettings))
)]
pub async fn update_preferences(
    State(state): State<ManagementState>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<UpdatePreferencesRequest>,
) -> ApiResult<Json<UserSettings>> {
    Ok(Json(state.directory.update_preferences(principal.id, req)?))
}
