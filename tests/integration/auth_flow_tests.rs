// ===================================
// tests/integration/auth_flow_tests.rs
// ===================================
//! Full login, gated access, check and logout flow through the router
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use teachdesk_backend_lib::config::{SessionSecret, Settings};
use tower::ServiceExt;

use crate::test_utils::{
    body_json, cookie_pair, from_peer, get_with_cookie, login_request, test_settings,
    test_state, with_header, TEST_PASSWORD,
};
use teachdesk_backend_lib::router::create_router;

fn app_with(settings: Settings) -> Router {
    create_router(test_state(settings))
}

fn logout_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/auth/logout");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_full_session_flow() {
    let app = app_with(test_settings());

    // login
    let response = app.clone().oneshot(login_request(TEST_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("; Path=/"));
    assert!(set_cookie.contains("; HttpOnly"));
    assert!(set_cookie.contains("; SameSite=Strict"));
    assert!(set_cookie.contains("; Max-Age=86400"));
    assert!(!set_cookie.contains("Secure"));
    let cookie = cookie_pair(&response);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "authenticated": true })
    );

    // the token has the documented shape
    let token = cookie.trim_start_matches("session=");
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].len(), 64);
    assert!(parts[1].parse::<u64>().is_ok());
    assert_eq!(parts[2].len(), 64);

    // check
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/check", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "authenticated": true })
    );

    // a gated route gets past the gate; nothing is mounted there
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/students", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NF_001");

    // logout clears the cookie and always succeeds
    let response = app
        .clone()
        .oneshot(logout_request(Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "authenticated": false })
    );

    // without the cookie the client is out
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/check", None))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "authenticated": false })
    );
    let response = app
        .oneshot(get_with_cookie("/api/students", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cookie_among_others() {
    let app = app_with(test_settings());
    let response = app.clone().oneshot(login_request(TEST_PASSWORD)).await.unwrap();
    let cookie = cookie_pair(&response);

    let header = format!("theme=dark; {cookie}; lang=de");
    let response = app
        .oneshot(get_with_cookie("/api/students", Some(&header)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_without_session() {
    let response = app_with(test_settings())
        .oneshot(logout_request(None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password() {
    let response = app_with(test_settings())
        .oneshot(login_request("schlagzeug-2024!"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        body_json(response).await,
        serde_json::json!({
            "error": { "code": "AUTH_002", "message": "Authentication failed" }
        })
    );
}

#[tokio::test]
async fn test_malformed_login_body() {
    let app = app_with(test_settings());
    for body in ["", "{", "{\"pass\":\"x\"}", "[]", "{\"password\":42}"] {
        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body:?}");
        assert_eq!(body_json(response).await["error"]["code"], "VAL_001");
    }
}

#[tokio::test]
async fn test_lockout_after_repeated_failures() {
    let app = app_with(test_settings());

    // max_attempts is 3 in the test settings
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(from_peer(login_request("wrong"), "203.0.113.9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // even the right password is refused while locked out
    let response = app
        .clone()
        .oneshot(from_peer(login_request(TEST_PASSWORD), "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"]["code"], "AUTH_003");

    // other clients are unaffected
    let response = app
        .oneshot(from_peer(login_request(TEST_PASSWORD), "198.51.100.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_headers_cannot_dodge_lockout() {
    let app = app_with(test_settings());

    for i in 0..3 {
        let request = with_header(
            from_peer(login_request("wrong"), "203.0.113.9"),
            "x-forwarded-for",
            &format!("10.0.0.{i}"),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let request = with_header(
        with_header(
            from_peer(login_request(TEST_PASSWORD), "203.0.113.9"),
            "x-forwarded-for",
            "10.0.0.200",
        ),
        "x-real-ip",
        "10.0.0.201",
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_lockout_behind_trusted_proxy() {
    let settings = Settings {
        trusted_proxies: vec!["10.0.0.1".parse().unwrap()],
        ..test_settings()
    };
    let app = app_with(settings);
    let via_proxy = |password: &str, chain: &str| {
        with_header(
            from_peer(login_request(password), "10.0.0.1"),
            "x-forwarded-for",
            chain,
        )
    };

    // the client controls everything left of what the proxy appended
    for spoofed in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
        let response = app
            .clone()
            .oneshot(via_proxy("wrong", &format!("{spoofed}, 203.0.113.9")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app
        .clone()
        .oneshot(via_proxy(TEST_PASSWORD, "4.4.4.4, 203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // a different client behind the same proxy still gets in
    let response = app
        .oneshot(via_proxy(TEST_PASSWORD, "198.51.100.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_success_resets_failures() {
    let app = app_with(test_settings());
    for password in ["wrong", "wrong", TEST_PASSWORD, "wrong", "wrong"] {
        app.clone().oneshot(login_request(password)).await.unwrap();
    }
    let response = app.oneshot(login_request(TEST_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_hash_refuses_every_login() {
    let settings = Settings {
        password_hash: None,
        ..test_settings()
    };
    let app = app_with(settings);
    for password in [TEST_PASSWORD, "", "anything"] {
        let response = app.clone().oneshot(login_request(password)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_missing_secret_fails_closed() {
    let issuer = app_with(test_settings());
    let response = issuer.oneshot(login_request(TEST_PASSWORD)).await.unwrap();
    let cookie = cookie_pair(&response);

    let settings = Settings {
        session_secret: None,
        ..test_settings()
    };
    let app = app_with(settings);

    // login fails loudly but reveals nothing, whatever the password
    let mut outcomes = Vec::new();
    for password in [TEST_PASSWORD, "wrong", ""] {
        let response = app.clone().oneshot(login_request(password)).await.unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        outcomes.push((response.status(), body_json(response).await));
    }
    for (status, body) in &outcomes {
        assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "CFG_001");
        assert!(!body.to_string().contains("secret"));
    }
    assert!(outcomes.windows(2).all(|pair| pair[0] == pair[1]));

    // tokens from elsewhere are worthless
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/students", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = app
        .oneshot(get_with_cookie("/api/auth/check", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "authenticated": false })
    );
}

#[tokio::test]
async fn test_rotated_secret_invalidates_sessions() {
    let response = app_with(test_settings())
        .oneshot(login_request(TEST_PASSWORD))
        .await
        .unwrap();
    let cookie = cookie_pair(&response);

    let rotated = Settings {
        session_secret: SessionSecret::new("rotated-secret"),
        ..test_settings()
    };
    let response = app_with(rotated)
        .oneshot(get_with_cookie("/api/students", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
