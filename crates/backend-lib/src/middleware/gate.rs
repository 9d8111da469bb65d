// crates/backend-lib/src/middleware/gate.rs

//! Session gate in front of the API.
//!
//! Every request under `/api` must carry a valid `session` cookie, except the
//! three authentication routes. Rejections all look the same: 401 and one
//! fixed JSON body, whatever the reason.
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use teachdesk_common::is_public_path;

use crate::auth::{extract_session_token, now_ms, EdgeVerifier, TokenVerifier};
use crate::config::SessionSecret;
use crate::error::AppError;
use crate::metrics::{GATE_ALLOWED, GATE_REJECTED};
use crate::AppState;

/// Prefix of the gated API surface
pub const API_PREFIX: &str = "/api";

/// Outcome for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Rejected,
}

/// Decides whether a request may reach its handler
#[derive(Debug, Clone)]
pub struct RequestGate {
    verifier: EdgeVerifier,
}

impl RequestGate {
    pub fn new(secret: Option<&SessionSecret>) -> Self {
        Self {
            verifier: EdgeVerifier::new(secret),
        }
    }

    /// Whether `path` belongs to the gated API surface
    pub fn is_gated(path: &str) -> bool {
        path.strip_prefix(API_PREFIX)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    pub fn decide(&self, path: &str, headers: &HeaderMap) -> GateDecision {
        self.decide_at(path, headers, now_ms())
    }

    pub fn decide_at(&self, path: &str, headers: &HeaderMap, now_ms: u64) -> GateDecision {
        if !Self::is_gated(path) || is_public_path(path) {
            return GateDecision::Allowed;
        }
        match extract_session_token(headers) {
            Some(token) if self.verifier.verify_at(token, now_ms) => GateDecision::Allowed,
            _ => GateDecision::Rejected,
        }
    }
}

/// Axum middleware wrapping [`RequestGate::decide`]
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match state.gate.decide(request.uri().path(), request.headers()) {
        GateDecision::Allowed => {
            counter!(GATE_ALLOWED).increment(1);
            next.run(request).await
        },
        GateDecision::Rejected => {
            counter!(GATE_REJECTED).increment(1);
            tracing::debug!(path = %request.uri().path(), "request rejected by session gate");
            AppError::Unauthenticated.into_response()
        },
    }
}
