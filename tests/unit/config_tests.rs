// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Loading settings from a file and wiring them into the services
use std::fs;

use teachdesk_backend_lib::{
    auth::SessionService,
    config::Settings,
    error::ConfigError,
};

const STORED: &str = "a3f1c2d4e5b60718293a4b5c6d7e8f90:d7bb52df78d81d3f16500e0df35012df148dea0a9befb5bcfca91f52844f5e2e6d2b23447be45c500da71a1c48a9481f1ce72374cf9e35cc258e99b827678d43";

#[test]
fn test_settings_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teachdesk.toml");
    fs::write(
        &path,
        format!(
            r#"
bind_addr = "0.0.0.0:8080"
production = true
password_hash = "{STORED}"
session_secret = "from-file"
upstream_origin = "https://sheets.example.org"

[login_throttle]
max_attempts = 10
"#
        ),
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.bind_addr.port(), 8080);
    assert!(settings.production);
    assert_eq!(settings.password_hash(), Some(STORED));
    assert_eq!(
        settings.session_secret().unwrap().as_bytes(),
        b"from-file"
    );
    assert_eq!(settings.login_throttle.max_attempts, 10);
    assert_eq!(settings.login_throttle.lockout_secs, 300);
    assert_eq!(settings.validate(), Ok(()));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teachdesk.toml");
    fs::write(&path, "bind_addr = [").unwrap();
    assert!(Settings::load_from(&path).is_err());
}

#[test]
fn test_unconfigured_settings_fail_closed() {
    let settings = Settings::default();
    assert_eq!(
        settings.validate(),
        Err(ConfigError::MissingSessionSecret)
    );

    let sessions = SessionService::from_settings(&settings);
    assert!(!sessions.passwords().is_configured());
    assert!(!sessions.tokens().is_configured());
    assert!(!sessions.check("anything.at.all"));
    assert!(sessions.login("").is_err());
}

#[test]
fn test_production_cookies_are_secure() {
    let settings = Settings {
        production: true,
        ..crate::test_utils::test_settings()
    };
    let sessions = SessionService::with_params(&settings, crate::test_utils::cheap_params());
    let session = sessions.login(crate::test_utils::TEST_PASSWORD).unwrap();
    assert!(session.set_cookie.ends_with("; Secure"));
    assert!(sessions.logout().contains("Max-Age=0"));
    assert!(sessions.logout().ends_with("; Secure"));
}
