// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Lockout for repeated failed logins.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ThrottleSettings;

/// How long a failure streak is remembered without a lockout
const FAILURE_MEMORY: Duration = Duration::from_secs(24 * 60 * 60);

/// Entry in the throttle map
#[derive(Debug, Clone)]
struct ThrottleEntry {
    /// Number of consecutive failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// When the current lockout ends, if locked out
    lockout_expiry: Option<Instant>,
}

/// Per-client failed login counter with temporary lockouts
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    /// Map of client keys to throttle entries
    attempts: Arc<DashMap<String, ThrottleEntry>>,
    /// Failures before lockout
    max_attempts: u32,
    /// Duration of a lockout
    lockout_duration: Duration,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::from_settings(&ThrottleSettings::default())
    }
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts: max_attempts.max(1),
            lockout_duration,
        }
    }

    pub fn from_settings(settings: &ThrottleSettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.lockout_secs),
        )
    }

    /// Record a failed login for `client`
    pub fn record_failure(&self, client: &str) {
        self.record_failure_at(client, Instant::now());
    }

    pub fn record_failure_at(&self, client: &str, now: Instant) {
        let mut entry = self
            .attempts
            .entry(client.to_string())
            .or_insert_with(|| ThrottleEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        // A served lockout starts a fresh streak
        if entry.lockout_expiry.is_some_and(|expiry| now >= expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts = entry.failed_attempts.saturating_add(1);
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(
                client,
                lockout_secs = self.lockout_duration.as_secs(),
                "client locked out after repeated failed logins"
            );
        }
    }

    /// Forget `client` after a successful login
    pub fn record_success(&self, client: &str) {
        self.attempts.remove(client);
    }

    /// Whether `client` may attempt a login now
    pub fn is_allowed(&self, client: &str) -> bool {
        self.is_allowed_at(client, Instant::now())
    }

    pub fn is_allowed_at(&self, client: &str, now: Instant) -> bool {
        self.attempts
            .get(client)
            .and_then(|entry| entry.lockout_expiry)
            .map_or(true, |expiry| now >= expiry)
    }

    /// Drop served lockouts and stale failure streaks
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    pub fn cleanup_at(&self, now: Instant) {
        self.attempts.retain(|_, entry| match entry.lockout_expiry {
            Some(expiry) => now < expiry,
            None => now.saturating_duration_since(entry.last_failure) < FAILURE_MEMORY,
        });
    }

    /// Number of tracked clients
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
