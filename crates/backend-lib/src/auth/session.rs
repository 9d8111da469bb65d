// ============================
// teachdesk-backend-lib/src/auth/session.rs
// ============================
//! Login, logout and session checks.
use scrypt::Params;
use teachdesk_common::SESSION_DURATION_MS;

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::password::PasswordVerifier;
use crate::auth::token::{now_ms, TokenCodec, TokenVerifier};
use crate::config::Settings;
use crate::error::{AppError, ConfigError};

/// A session handed out by a successful login
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The raw token
    pub token: String,
    /// Unix milliseconds after which the token is refused
    pub expires_at_ms: u64,
    /// Ready-made `Set-Cookie` value
    pub set_cookie: String,
}

/// Orchestrates password checks and token issuance.
///
/// Holds only immutable configuration, so one instance can be shared
/// across all requests.
#[derive(Clone)]
pub struct SessionService {
    passwords: PasswordVerifier,
    tokens: TokenCodec,
    secure_cookies: bool,
}

impl SessionService {
    pub fn new(passwords: PasswordVerifier, tokens: TokenCodec, secure_cookies: bool) -> Self {
        Self {
            passwords,
            tokens,
            secure_cookies,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            PasswordVerifier::new(settings.password_hash()),
            TokenCodec::new(settings.session_secret()),
            settings.production,
        )
    }

    /// Same as [`SessionService::from_settings`] with explicit scrypt cost
    pub fn with_params(settings: &Settings, params: Params) -> Self {
        Self::new(
            PasswordVerifier::with_params(settings.password_hash(), params),
            TokenCodec::new(settings.session_secret()),
            settings.production,
        )
    }

    /// Check the password and, on success, issue a session
    pub fn login(&self, password: &str) -> Result<IssuedSession, AppError> {
        self.login_at(password, now_ms())
    }

    pub fn login_at(&self, password: &str, now_ms: u64) -> Result<IssuedSession, AppError> {
        // Without a secret every attempt fails the same way, before the
        // password is looked at
        if !self.tokens.is_configured() {
            return Err(ConfigError::MissingSessionSecret.into());
        }
        if !self.passwords.verify_password(password) {
            return Err(AppError::InvalidCredentials);
        }
        let token = self.tokens.issue_at(now_ms)?;
        Ok(IssuedSession {
            set_cookie: session_cookie(&token, self.secure_cookies),
            expires_at_ms: now_ms.saturating_add(SESSION_DURATION_MS),
            token,
        })
    }

    /// `Set-Cookie` value that ends the session on the client
    pub fn logout(&self) -> String {
        clear_session_cookie(self.secure_cookies)
    }

    /// Whether `token` is a currently valid session
    pub fn check(&self, token: &str) -> bool {
        self.tokens.verify(token)
    }

    pub fn check_at(&self, token: &str, now_ms: u64) -> bool {
        self.tokens.verify_at(token, now_ms)
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn passwords(&self) -> &PasswordVerifier {
        &self.passwords
    }
}
