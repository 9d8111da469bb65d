// crates/backend-lib/src/middleware/security.rs

//! Response hardening headers and blocking of sensitive file paths.
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Settings;

/// Files that must never be served, even by accident
const SENSITIVE_FILES: [&str; 4] = [
    "/.env",
    "/.env.local",
    "/.env.production",
    "/.env.development",
];

/// Whether `path` points at environment files or repository metadata
pub fn is_sensitive_path(path: &str) -> bool {
    SENSITIVE_FILES.contains(&path) || path == "/.git" || path.starts_with("/.git/")
}

/// Answer 404 for sensitive paths before any routing happens
pub async fn deny_sensitive_paths(request: Request, next: Next) -> Response {
    if is_sensitive_path(request.uri().path()) {
        tracing::warn!(path = %request.uri().path(), "blocked request for sensitive path");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

fn content_security_policy(upstream: Option<&str>) -> String {
    let connect_src = match upstream {
        Some(origin) => format!("'self' {origin}"),
        None => "'self'".to_string(),
    };
    format!(
        "default-src 'self'; script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
         style-src 'self' 'unsafe-inline'; img-src 'self' data: blob:; font-src 'self'; \
         connect-src {connect_src}; frame-ancestors 'none';"
    )
}

/// Headers attached to every response
pub fn security_headers(settings: &Settings) -> Vec<(HeaderName, HeaderValue)> {
    let upstream = settings
        .upstream_origin
        .as_deref()
        .map(str::trim)
        .filter(|origin| !origin.is_empty());

    let csp = HeaderValue::from_str(&content_security_policy(upstream)).unwrap_or_else(|_| {
        tracing::warn!("upstream_origin is not a valid header value, leaving it out of the CSP");
        HeaderValue::from_str(&content_security_policy(None))
            .unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'"))
    });

    vec![
        (
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ),
        (
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ),
        (
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ),
        (
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ),
        (HeaderName::from_static("content-security-policy"), csp),
    ]
}

/// Layer every security header onto `router`
pub fn with_security_headers<S>(router: Router<S>, settings: &Settings) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    security_headers(settings)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}
