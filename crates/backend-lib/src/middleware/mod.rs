// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `TeachDesk` backend.

pub mod gate;
pub mod security;

pub use gate::{require_session, GateDecision, RequestGate};
pub use security::{deny_sensitive_paths, with_security_headers};
