// ============================
// teachdesk-backend-lib/src/lib.rs
// ============================
//! Core backend functionality for the `TeachDesk` dashboard: one shared
//! password, stateless signed session cookies and a gate in front of every
//! API route.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;

use std::sync::Arc;

use crate::auth::{LoginThrottle, SessionService};
use crate::config::Settings;
use crate::middleware::gate::RequestGate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings the process was started with
    pub settings: Arc<Settings>,
    /// Login, logout and session checks
    pub sessions: Arc<SessionService>,
    /// Token check run before every API handler
    pub gate: Arc<RequestGate>,
    /// Failed-login lockouts
    pub throttle: LoginThrottle,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        let sessions = SessionService::from_settings(&settings);
        Self::with_sessions(settings, sessions)
    }

    /// Create a new application state around an existing session service
    pub fn with_sessions(settings: Settings, sessions: SessionService) -> Self {
        let gate = RequestGate::new(settings.session_secret());
        let throttle = LoginThrottle::from_settings(&settings.login_throttle);

        Self {
            settings: Arc::new(settings),
            sessions: Arc::new(sessions),
            gate: Arc::new(gate),
            throttle,
        }
    }
}
