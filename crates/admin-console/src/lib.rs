//! Admin console: an isolated surface for administrators to manage users,
//! campaigns, clients and raw metric records.
//!
//! Console sessions come from their own [`pulse_management::SessionRegistry`]
//! and only accounts with the admin role can obtain one.

pub mod handlers;
pub mod router;
pub mod user_ops;

pub use handlers::AdminState;
pub use router::admin_router;
pub use user_ops::{ensure_bootstrap_admin, UserOps};
