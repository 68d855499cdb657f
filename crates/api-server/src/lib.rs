#![warn(clippy::unwrap_used)]

pub mod analytics_rest;
pub mod dashboard_rest;
pub mod rest;
pub mod server;
pub mod swagger;
pub mod upload_rest;

pub use server::{ApiServer, Services};
pub use swagger::ApiDoc;
