// ============================
// teachdesk-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod cookie;
pub mod edge;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod token;

pub use cookie::{clear_session_cookie, extract_session_token, session_cookie};
pub use edge::EdgeVerifier;
pub use password::{hash_password, PasswordVerifier, StoredHash};
pub use rate_limit::LoginThrottle;
pub use session::{IssuedSession, SessionService};
pub use token::{now_ms, TokenCodec, TokenRejection, TokenVerifier};
