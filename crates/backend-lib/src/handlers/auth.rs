// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login, logout and session check endpoints.
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, OriginalUri, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use metrics::counter;
use teachdesk_common::{AuthStatus, LoginRequest};
use tracing::instrument;

use crate::auth::extract_session_token;
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, LOGIN_THROTTLED, LOGOUT};
use crate::AppState;

/// Key used when the peer address is not known
pub const UNKNOWN_CLIENT: &str = "unknown";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Throttle key for the caller.
///
/// The key is the peer address. Forwarding headers are only read when the
/// peer is one of `trusted_proxies`; the key is then the right-most
/// `X-Forwarded-For` hop that is not itself a trusted proxy, or `X-Real-IP`
/// when there is no `X-Forwarded-For`. Hops left of that are client supplied
/// and ignored.
pub fn client_key(peer: Option<IpAddr>, headers: &HeaderMap, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return UNKNOWN_CLIENT.to_string();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        let mut nearest = peer;
        for hop in forwarded.rsplit(',').map(str::trim) {
            let Ok(ip) = hop.parse::<IpAddr>() else {
                // garbage before any untrusted hop, stop at the last proxy
                return nearest.to_string();
            };
            if !trusted_proxies.contains(&ip) {
                return ip.to_string();
            }
            nearest = ip;
        }
        return nearest.to_string();
    }

    header_str(headers, "x-real-ip")
        .and_then(|ip| ip.parse::<IpAddr>().ok())
        .unwrap_or(peer)
        .to_string()
}

/// `POST /api/auth/login`
#[instrument(skip_all, fields(client = tracing::field::Empty))]
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let peer = connect_info.map(|Extension(ConnectInfo(addr))| addr.ip());
    let client = client_key(peer, &headers, &state.settings.trusted_proxies);
    tracing::Span::current().record("client", client.as_str());

    if !state.throttle.is_allowed(&client) {
        counter!(LOGIN_THROTTLED).increment(1);
        tracing::warn!("login refused, client is locked out");
        return Err(AppError::AuthRateLimited);
    }

    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected login body");
        AppError::InvalidInput("expected a JSON object with a `password` field".to_string())
    })?;

    // scrypt is deliberately slow, keep it off the reactor
    let sessions = state.sessions.clone();
    let outcome = tokio::task::spawn_blocking(move || sessions.login(&request.password)).await?;

    match outcome {
        Ok(session) => {
            state.throttle.record_success(&client);
            counter!(LOGIN_SUCCESS).increment(1);
            tracing::info!(expires_at_ms = session.expires_at_ms, "login succeeded");
            Ok((
                [(SET_COOKIE, session.set_cookie)],
                Json(AuthStatus::new(true)),
            )
                .into_response())
        },
        Err(AppError::InvalidCredentials) => {
            state.throttle.record_failure(&client);
            counter!(LOGIN_FAILURE).increment(1);
            tracing::warn!("login failed");
            Err(AppError::InvalidCredentials)
        },
        Err(err) => Err(err),
    }
}

/// `POST /api/auth/logout`. Always succeeds.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Response {
    counter!(LOGOUT).increment(1);
    (
        [(SET_COOKIE, state.sessions.logout())],
        Json(AuthStatus::new(false)),
    )
        .into_response()
}

/// `GET /api/auth/check`
#[instrument(skip_all)]
pub async fn check(State(state): State<AppState>, headers: HeaderMap) -> Json<AuthStatus> {
    let authenticated =
        extract_session_token(&headers).is_some_and(|token| state.sessions.check(token));
    Json(AuthStatus::new(authenticated))
}

/// Fallback for API paths that matched no route. Only reached past the gate.
pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
