//! User management for the admin console: create, update (role, profile,
//! password) and delete accounts, plus the optional bootstrap admin.

use pulse_core::config::AdminConfig;
use pulse_core::types::User;
use pulse_core::{PulseError, PulseResult, Role};
use pulse_management::auth::{validate_password, PasswordHasher, SessionRegistry};
use pulse_management::models::UpdateProfileRequest;
use pulse_management::store::{DirectoryStore, NewUser};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
}

pub struct UserOps {
    directory: Arc<DirectoryStore>,
    hasher: PasswordHasher,
    /// Sessions of the main API; revoked when an account changes role or
    /// disappears so stale tokens stop working.
    app_sessions: Arc<SessionRegistry>,
}

impl UserOps {
    pub fn new(
        directory: Arc<DirectoryStore>,
        hasher: PasswordHasher,
        app_sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            directory,
            hasher,
            app_sessions,
        }
    }

    pub fn list(&self) -> Vec<User> {
        self.directory.all_users()
    }

    pub async fn create(&self, req: CreateUserRequest) -> PulseResult<User> {
        validate_password(&req.password)?;
        if self.directory.find_user_by_email(&req.email).is_some() {
            return Err(PulseError::Validation("email is already registered".into()));
        }
        let password_hash = self.hasher.hash(req.password).await?;
        let user = self.directory.create_user(NewUser {
            email: req.email,
            password_hash,
            role: req.role,
            first_name: req.first_name,
            last_name: req.last_name,
        })?;
        info!(user_id = %user.id, role = ?user.role, "User created by admin");
        Ok(user)
    }

    /// Apply an admin edit. All checks run before the first write and
    /// sessions are revoked only once the edit has landed.
    pub async fn update(&self, id: Uuid, req: UpdateUserRequest) -> PulseResult<User> {
        if self.directory.get_user(id).is_none() {
            return Err(PulseError::NotFound(format!("user {id}")));
        }
        if let Some(password) = &req.password {
            validate_password(password)?;
        }
        if let Some(email) = &req.email {
            if let Some(owner) = self.directory.find_user_by_email(email) {
                if owner.id != id {
                    return Err(PulseError::Validation("email is already registered".into()));
                }
            }
        }
        let password_hash = match req.password {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };

        let mut user = self.directory.update_profile(
            id,
            UpdateProfileRequest {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                company: req.company,
                position: req.position,
                phone: req.phone,
            },
        )?;
        let credentials_changed = password_hash.is_some() || req.role.is_some();
        if let Some(hash) = password_hash {
            self.directory.set_password_hash(id, hash)?;
        }
        if let Some(role) = req.role {
            user = self.directory.set_role(id, role)?;
        }
        if credentials_changed {
            self.app_sessions.revoke_user(id);
        }
        info!(user_id = %id, "User updated by admin");
        Ok(user)
    }

    /// Delete an account. An admin cannot delete themselves.
    pub fn delete(&self, id: Uuid, acting_admin: Uuid) -> PulseResult<User> {
        if id == acting_admin {
            return Err(PulseError::Validation("cannot delete your own account".into()));
        }
        let user = self
            .directory
            .remove_user(id)
            .ok_or_else(|| PulseError::NotFound(format!("user {id}")))?;
        self.app_sessions.revoke_user(id);
        info!(user_id = %id, "User deleted by admin");
        Ok(user)
    }
}

/// Create the configured bootstrap admin when both credentials are set and
/// the account does not exist yet. Returns the created account.
pub async fn ensure_bootstrap_admin(
    directory: &DirectoryStore,
    hasher: &PasswordHasher,
    config: &AdminConfig,
) -> PulseResult<Option<User>> {
    let (Some(email), Some(password)) = (&config.bootstrap_email, &config.bootstrap_password) else {
        return Ok(None);
    };
    if directory.find_user_by_email(email).is_some() {
        info!(email = %email, "Bootstrap admin already present");
        return Ok(None);
    }
    validate_password(password)?;
    let password_hash = hasher.hash(password.clone()).await?;
    let user = directory.create_user(NewUser {
        email: email.clone(),
        password_hash,
        role: Role::Admin,
        first_name: "Admin".into(),
        last_name: String::new(),
    })?;
    info!(user_id = %user.id, "Bootstrap admin created");
    Ok(Some(user))
}
