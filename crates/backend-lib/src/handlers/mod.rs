// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.

pub mod auth;
pub mod health;

pub use auth::{api_not_found, check, client_key, login, logout, UNKNOWN_CLIENT};
pub use health::health;
