// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const LOGIN_THROTTLED: &str = "auth.login.throttled";
pub const LOGOUT: &str = "auth.logout";
pub const GATE_ALLOWED: &str = "gate.allowed";
pub const GATE_REJECTED: &str = "gate.rejected";
