// ============================
// teachdesk-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use zeroize::Zeroize;

use crate::auth::password::StoredHash;
use crate::error::ConfigError;


/// Default config file, looked up in the working directory
pub const CONFIG_FILE: &str = "teachdesk.toml";

/// Prefix for environment overrides, nested keys split on `__`
pub const ENV_PREFIX: &str = "TEACHDESK_";

/// Symmetric key for session MACs. Never printed, wiped on drop.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Returns `None` for an empty secret so it can never sign anything.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SessionSecret {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

impl Drop for SessionSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Production deployment: secure cookies, fatal config problems
    pub production: bool,
    /// Shared password hash in `salt:hash` hex format
    pub password_hash: Option<String>,
    /// Key for session token MACs
    pub session_secret: Option<SessionSecret>,
    /// Failed-login throttling
    pub login_throttle: ThrottleSettings,
    /// Origin of the spreadsheet backend the dashboard talks to
    pub upstream_origin: Option<String>,
    /// Reverse proxies whose forwarding headers are believed
    pub trusted_proxies: Vec<IpAddr>,
}

/// Failed-login lockout settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Failures allowed before a client is locked out
    pub max_attempts: u32,
    /// Length of a lockout in seconds
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            log_json: false,
            production: false,
            password_hash: None,
            session_secret: None,
            login_throttle: ThrottleSettings::default(),
            upstream_origin: None,
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Layered sources: `path`, then `TEACHDESK_*`, then the bare
    /// `APP_PASSWORD_HASH` / `SESSION_SECRET` variables.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["APP_PASSWORD_HASH", "SESSION_SECRET"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("app_password_hash") {
                            "password_hash".into()
                        } else {
                            key.as_str().to_ascii_lowercase().into()
                        }
                    }),
            )
    }

    /// Extract settings from an already-assembled figment
    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    /// Load settings from `teachdesk.toml` and the environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load settings from a specific config file and the environment
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::from_figment(&Self::figment(path))?)
    }

    /// The session secret, treating an empty value as absent
    pub fn session_secret(&self) -> Option<&SessionSecret> {
        self.session_secret.as_ref().filter(|s| !s.is_empty())
    }

    /// The password hash, treating an empty value as absent
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref().filter(|h| !h.is_empty())
    }

    /// Report the first credential problem, if any
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secret().is_none() {
            return Err(ConfigError::MissingSessionSecret);
        }
        let Some(hash) = self.password_hash() else {
            return Err(ConfigError::MissingPasswordHash);
        };
        if StoredHash::parse(hash).is_none() {
            return Err(ConfigError::MalformedPasswordHash);
        }
        Ok(())
    }
}
