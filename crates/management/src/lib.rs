//! Campaign/client/user directory and the account, campaign, client and
//! settings REST endpoints built on it.
//!
//! Data lives in DashMap; bearer tokens are held in an in-process
//! [`auth::SessionRegistry`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use auth::{PasswordHasher, SessionRegistry};
pub use error::{ApiError, ApiResult, AppJson};
pub use handlers::ManagementState;
pub use router::management_router;
pub use store::DirectoryStore;
