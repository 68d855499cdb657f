//! Admin console router. Paths are relative; the API server nests it under
//! `/admin/api`.

use crate::handlers::{self, AdminState};
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use pulse_core::{Principal, PulseError};
use pulse_management::auth::require_auth;
use pulse_management::ApiError;

pub fn admin_router(state: AdminState) -> Router {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route("/users/:id", patch(handlers::update_user).delete(handlers::delete_user))
        .route("/campaigns", get(handlers::list_campaigns))
        .route("/campaigns/:id", delete(handlers::delete_campaign))
        .route("/clients", get(handlers::list_clients))
        .route("/clients/:id", delete(handlers::delete_client))
        .route("/records", get(handlers::list_records).post(handlers::create_record))
        .route("/records/:id", delete(handlers::delete_record))
        // Runs after `require_auth`, which is added below and so wraps it.
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.sessions.clone(), require_auth));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
        .with_state(state)
}

async fn require_admin(req: Request, next: Next) -> Response {
    match req.extensions().get::<Principal>() {
        Some(principal) if principal.is_admin() => next.run(req).await,
        _ => ApiError(PulseError::Forbidden("admin role required".into())).into_response(),
    }
}
