//! Password hashing, bearer-token sessions and the middleware that turns a
//! token into a [`Principal`].

use crate::error::ApiError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use pulse_core::{Principal, PulseError, PulseResult, Role};
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id password hasher. Hashing runs on the blocking pool.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }

    /// Custom cost parameters, e.g. cheap settings for tests.
    pub fn with_params(memory_cost: u32, time_cost: u32, parallelism: u32) -> PulseResult<Self> {
        let params = Params::new(memory_cost, time_cost, parallelism, None)
            .map_err(|e| PulseError::Config(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    pub async fn hash(&self, password: String) -> PulseResult<String> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
        })
        .await
        .map_err(|e| PulseError::Internal(anyhow::anyhow!("password hash task failed: {e}")))?
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            PulseError::Internal(anyhow::anyhow!("password hashing failed"))
        })
    }

    /// `false` for a wrong password or an unparseable stored hash.
    pub async fn verify(&self, password: String, hash: String) -> PulseResult<bool> {
        tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                error!(error = %e, "Stored password hash is malformed");
                false
            }
        })
        .await
        .map_err(|e| PulseError::Internal(anyhow::anyhow!("password verify task failed: {e}")))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_password(password: &str) -> PulseResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PulseError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ─── Sessions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// Issued bearer tokens with expiry. Tokens carry `prefix` so tokens from
/// different registries are never confused.
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
    ttl: Duration,
    prefix: &'static str,
}

impl SessionRegistry {
    pub fn new(prefix: &'static str, ttl_hours: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::hours(ttl_hours),
            prefix,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> (String, DateTime<Utc>) {
        let token = generate_token(self.prefix);
        let expires_at = Utc::now() + self.ttl;
        self.sessions.insert(
            token.clone(),
            Session {
                principal: Principal::new(user_id, role),
                expires_at,
            },
        );
        (token, expires_at)
    }

    /// Resolve a token; expired tokens are dropped on sight.
    pub fn resolve(&self, token: &str) -> Option<Principal> {
        let session = self.sessions.get(token)?.value().clone();
        if session.expires_at <= Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(session.principal)
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every session of `user_id`, e.g. after a role change or delete.
    pub fn revoke_user(&self, user_id: Uuid) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            let keep = s.principal.id != user_id;
            removed += usize::from(!keep);
            keep
        });
        removed
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            let keep = s.expires_at > now;
            removed += usize::from(!keep);
            keep
        });
        removed
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

fn generate_token(prefix: &str) -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", prefix, hex::encode(bytes))
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum middleware: resolve the bearer token and stash the [`Principal`] in
/// request extensions, or answer 401.
pub async fn require_auth(
    State(sessions): State<Arc<SessionRegistry>>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = match bearer_token(req.headers()) {
        Some(token) => sessions.resolve(token),
        None => {
            return ApiError(PulseError::Unauthorized(
                "Authorization header with Bearer token required".into(),
            ))
            .into_response()
        }
    };

    match principal {
        Some(principal) => {
            debug!(user_id = %principal.id, "Request authenticated");
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        None => ApiError(PulseError::Unauthorized(
            "Invalid or expired bearer token".into(),
        ))
        .into_response(),
    }
}
