// ============================
// teachdesk-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! The stored credential is `<hex salt>:<hex key>`, where the key is 64 bytes
//! of scrypt output (N = 2^14, r = 8, p = 1). The salt goes into scrypt as
//! the bytes of its hex text, which is what existing deployments produced.
use rand::RngCore;
use scrypt::{scrypt, Params};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Length of the derived key in bytes
pub const DERIVED_KEY_LEN: usize = 64;

/// Length of freshly generated salts in bytes
pub const SALT_LEN: usize = 16;

const LOG_N: u8 = 14;
const R: u32 = 8;
const P: u32 = 1;

/// Salt used when no hash is configured, so a rejected login costs the same
const DUMMY_SALT: &[u8] = b"00000000000000000000000000000000";

/// Production scrypt parameters
pub fn default_params() -> Params {
    // constant arguments, never rejected
    Params::new(LOG_N, R, P, DERIVED_KEY_LEN).unwrap_or_default()
}

/// A parsed `salt:hash` credential
#[derive(Clone)]
pub struct StoredHash {
    salt: String,
    key: Vec<u8>,
}

impl StoredHash {
    /// Parse `salt:hash`. Both halves must be non-empty hex and the key must
    /// be exactly [`DERIVED_KEY_LEN`] bytes.
    pub fn parse(stored: &str) -> Option<Self> {
        let (salt, hash) = stored.trim().split_once(':')?;
        if salt.is_empty() || hash.is_empty() {
            return None;
        }
        hex::decode(salt).ok()?;
        let key = hex::decode(hash).ok()?;
        if key.len() != DERIVED_KEY_LEN {
            return None;
        }
        Some(Self {
            salt: salt.to_string(),
            key,
        })
    }
}

/// Checks candidates against the one configured password hash
#[derive(Clone)]
pub struct PasswordVerifier {
    stored: Option<StoredHash>,
    params: Params,
}

impl PasswordVerifier {
    /// Build a verifier from the configured hash, if any. A hash that does
    /// not parse behaves exactly like a missing one.
    pub fn new(stored: Option<&str>) -> Self {
        Self::with_params(stored, default_params())
    }

    /// Same as [`PasswordVerifier::new`] with explicit scrypt parameters
    pub fn with_params(stored: Option<&str>, params: Params) -> Self {
        Self {
            stored: stored.and_then(StoredHash::parse),
            params,
        }
    }

    /// Whether a usable hash is configured
    pub fn is_configured(&self) -> bool {
        self.stored.is_some()
    }

    /// Verify a password. Never errors: anything unexpected is `false`.
    pub fn verify_password(&self, candidate: &str) -> bool {
        match &self.stored {
            Some(stored) => match derive(candidate, stored.salt.as_bytes(), &self.params) {
                Some(derived) => bool::from(derived.as_slice().ct_eq(stored.key.as_slice())),
                None => false,
            },
            None => {
                let _ = derive(candidate, DUMMY_SALT, &self.params);
                false
            },
        }
    }
}

fn derive(password: &str, salt: &[u8], params: &Params) -> Option<Zeroizing<[u8; DERIVED_KEY_LEN]>> {
    let mut out = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    scrypt(password.as_bytes(), salt, params, out.as_mut_slice()).ok()?;
    Some(out)
}

/// Hash a password into a fresh `salt:hash` line
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    hash_password_with(plain, &default_params())
}

/// Hash a password with explicit scrypt parameters
pub fn hash_password_with(plain: &str, params: &Params) -> anyhow::Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);

    let key = derive(plain, salt.as_bytes(), params)
        .ok_or_else(|| anyhow::anyhow!("scrypt rejected the output length"))?;
    Ok(format!("{salt}:{}", hex::encode(key.as_slice())))
}
