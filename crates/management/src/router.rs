//! Management API router: public auth endpoints plus the bearer-protected
//! campaign, client and settings endpoints.

use crate::auth::require_auth;
use crate::handlers::{self, ManagementState};
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;

pub fn management_router(state: ManagementState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login));

    let protected = Router::new()
        .route("/api/auth/logout", post(handlers::logout))
        // Campaigns
        .route("/api/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/campaigns/:id", patch(handlers::update_campaign).delete(handlers::delete_campaign))
        // Clients
        .route("/api/clients", post(handlers::create_client))
        .route("/api/clients/dashboard", get(handlers::client_dashboard))
        .route("/api/clients/:id", get(handlers::get_client).patch(handlers::update_client))
        // Settings
        .route("/api/settings/profile", get(handlers::get_profile).patch(handlers::update_profile))
        .route("/api/settings/preferences", patch(handlers::update_preferences))
        .route_layer(middleware::from_fn_with_state(state.sessions.clone(), require_auth));

    public.merge(protected).with_state(state)
}
