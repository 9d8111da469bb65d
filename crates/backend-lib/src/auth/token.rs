// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Session token issuance and verification.
//!
//! Wire format: `<nonce>.<expiry_ms>.<mac>` where `nonce` is 32 random bytes
//! in hex, `expiry_ms` is absolute Unix time in milliseconds and `mac` is
//! hex `HMAC-SHA256(secret, "<nonce>.<expiry_ms>")`. A token is valid while
//! `now_ms <= expiry_ms`.
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use teachdesk_common::SESSION_DURATION_MS;
use thiserror::Error;

use crate::config::SessionSecret;
use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes per nonce (hex-encoded to twice this length)
pub const NONCE_BYTES: usize = 32;

/// Current Unix time in milliseconds
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Why a token was turned away. Only ever logged, never returned to clients.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("no session secret configured")]
    NotConfigured,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    Forged,

    #[error("token has expired")]
    Expired,
}

/// Anything that can decide whether a session token is currently valid.
///
/// Implemented by [`TokenCodec`] and by the gate's
/// [`EdgeVerifier`](crate::auth::edge::EdgeVerifier); the two must agree on
/// every input.
pub trait TokenVerifier: Send + Sync {
    fn verify_at(&self, token: &str, now_ms: u64) -> bool;

    fn verify(&self, token: &str) -> bool {
        self.verify_at(token, now_ms())
    }
}

/// Issues and verifies session tokens with the `hmac` crate
#[derive(Clone, Debug)]
pub struct TokenCodec {
    secret: Option<SessionSecret>,
}

impl TokenCodec {
    pub fn new(secret: Option<&SessionSecret>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).cloned(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Issue a token valid for 24 hours from now
    pub fn issue(&self) -> Result<String, ConfigError> {
        self.issue_at(now_ms())
    }

    /// Issue a token valid for 24 hours from `now_ms`
    pub fn issue_at(&self, now_ms: u64) -> Result<String, ConfigError> {
        let secret = self.secret.as_ref().ok_or(ConfigError::MissingSessionSecret)?;

        let mut nonce = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut nonce);
        let nonce = hex::encode(nonce);
        let expiry = now_ms.saturating_add(SESSION_DURATION_MS);

        let payload = format!("{nonce}.{expiry}");
        let mac = sign(secret, &payload);
        Ok(format!("{payload}.{mac}"))
    }

    /// Full verification result, with the reason on rejection
    pub fn inspect_at(&self, token: &str, now_ms: u64) -> Result<(), TokenRejection> {
        let secret = self.secret.as_ref().ok_or(TokenRejection::NotConfigured)?;

        let mut parts = token.split('.');
        let (Some(nonce), Some(expiry), Some(mac), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenRejection::Malformed);
        };
        if nonce.is_empty() || expiry.is_empty() || mac.is_empty() {
            return Err(TokenRejection::Malformed);
        }

        let expected = sign(secret, &format!("{nonce}.{expiry}"));
        if !bool::from(mac.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(TokenRejection::Forged);
        }

        let expiry: u64 = expiry.parse().map_err(|_| TokenRejection::Malformed)?;
        if now_ms > expiry {
            return Err(TokenRejection::Expired);
        }
        Ok(())
    }
}

impl TokenVerifier for TokenCodec {
    fn verify_at(&self, token: &str, now_ms: u64) -> bool {
        match self.inspect_at(token, now_ms) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(%reason, "session token rejected");
                false
            },
        }
    }
}

/// Hex HMAC-SHA256 of `payload` under `secret`
pub fn sign(secret: &SessionSecret, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC key length is always valid");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
