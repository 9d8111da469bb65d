// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use teachdesk_common::{ErrorBody, ErrorDetail};
use thiserror::Error;

/// Operator mistakes in the credential configuration.
///
/// These are the only failures allowed to be told apart, and only in
/// server-side logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session secret is not configured")]
    MissingSessionSecret,

    #[error("password hash is not configured")]
    MissingPasswordHash,

    #[error("password hash is not in `salt:hash` hex format")]
    MalformedPasswordHash,
}

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, malformed, expired or forged session. Deliberately carries
    /// no detail.
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::AuthRateLimited => "AUTH_003",
            AppError::Config(_) => "CFG_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::NotFound(_) => "NF_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for the client
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "Not authenticated".to_string(),
            AppError::InvalidCredentials => "Authentication failed".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::Config(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::InvalidInput(detail) => format!("Invalid input: {detail}"),
            AppError::NotFound(_) => "Resource not found".to_string(),
        }
    }

    /// The JSON body sent for this error
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.sanitized_message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Configuration problems are logged here and never echoed
        if let AppError::Config(ref err) = self {
            tracing::error!(error = %err, "request failed on configuration error");
        }
        if let AppError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "request failed on internal error");
        }

        (status, axum::Json(self.body())).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {err}"))
    }
}
