// ================
// common/src/lib.rs
// ================
//! Common types and constants
//! shared between the `TeachDesk` dashboard client and the backend.
//! This module defines the authentication wire contract: request and
//! response bodies, the session cookie name and the public auth routes.

use serde::{Deserialize, Serialize};

/// Name of the cookie that carries the session token
pub const SESSION_COOKIE: &str = "session";

/// Lifetime of a session token in milliseconds (24 hours)
pub const SESSION_DURATION_MS: u64 = 24 * 60 * 60 * 1000;

/// Lifetime of the session cookie in seconds, matching the token
pub const SESSION_MAX_AGE_SECS: u64 = SESSION_DURATION_MS / 1000;

/// Login endpoint
pub const LOGIN_PATH: &str = "/api/auth/login";
/// Logout endpoint
pub const LOGOUT_PATH: &str = "/api/auth/logout";
/// Session check endpoint
pub const CHECK_PATH: &str = "/api/auth/check";

/// Routes that are reachable without a session
pub const PUBLIC_PATHS: [&str; 3] = [LOGIN_PATH, LOGOUT_PATH, CHECK_PATH];

/// Body of a login request
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    /// The shared dashboard password
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a login, logout or session check
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthStatus {
    pub authenticated: bool,
}

impl AuthStatus {
    pub const fn new(authenticated: bool) -> Self {
        Self { authenticated }
    }
}

/// Error payload returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Stable error code plus a client-safe message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Whether `path` is one of the public authentication routes
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}
