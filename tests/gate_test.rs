//! Integration tests for the admin session gate.
//!
//! These run the gate over the real HTTP client against a mock backend:
//! - Login failure reasons, including the rate-limit lockout
//! - The CSRF cookie captured at login and echoed on admin calls
//! - A 401 on an admin call ending the session

use statusboard::client::RequestClient;
use statusboard::session::{AdminError, Gate, LoginError, SessionState};

use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gate_for(server: &MockServer) -> Gate {
    let client = RequestClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    Gate::new(Arc::new(client))
}

async fn mount_login_ok(server: &MockServer, csrf: &str) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("csrf={}; Path=/", csrf).as_str())
                .set_body_json(serde_json::json!({"ok": true})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_locked_out_after_repeated_failures() {
    let mock_server = MockServer::start().await;

    // Two bad passwords, then the backend blocks the address
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("access denied"))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let gate = gate_for(&mock_server);

    for _ in 0..2 {
        let err = assert_err!(gate.login("admin", "wrong").await);
        assert!(matches!(err, LoginError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid username or password");
        assert!(err.retry_now());
    }

    let err = assert_err!(gate.login("admin", "wrong").await);
    assert!(matches!(err, LoginError::RateLimited));
    assert_eq!(
        err.to_string(),
        "Access denied - too many failed attempts. Try again later."
    );
    assert!(!err.retry_now());
    assert_eq!(gate.state().await, SessionState::Anonymous);
}

#[tokio::test]
async fn test_csrf_cookie_echoed_on_admin_calls() {
    let mock_server = MockServer::start().await;
    mount_login_ok(&mock_server, "tok-abc").await;

    Mock::given(method("POST"))
        .and(path("/api/admin/toggle-monitoring"))
        .and(header("X-CSRF-Token", "tok-abc"))
        .and(body_json(serde_json::json!({"service": "plex", "enable": false})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"service": "plex", "enabled": false})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let gate = gate_for(&mock_server);
    let session = assert_ok!(gate.login("admin", "secret").await);
    assert_eq!(session.csrf_token, "tok-abc");

    let result = assert_ok!(gate.toggle_monitoring("plex", false).await);
    assert_eq!(result.service, "plex");
    assert!(!result.enabled);
}

#[tokio::test]
async fn test_admin_401_ends_session() {
    let mock_server = MockServer::start().await;
    mount_login_ok(&mock_server, "tok-xyz").await;

    Mock::given(method("POST"))
        .and(path("/api/admin/reset-recent"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&mock_server)
        .await;

    let gate = gate_for(&mock_server);
    assert_ok!(gate.login("admin", "secret").await);
    assert!(gate.is_authenticated().await);

    let err = assert_err!(gate.reset_recent().await);
    assert!(matches!(err, AdminError::SessionExpired));
    assert!(!gate.is_authenticated().await);

    // further admin calls fail locally
    let err = assert_err!(gate.reset_recent().await);
    assert!(matches!(err, AdminError::NotAuthenticated));
}

#[tokio::test]
async fn test_whoami_reflects_server_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"authenticated": true, "user": "admin"})),
        )
        .mount(&mock_server)
        .await;

    let gate = gate_for(&mock_server);
    let state = assert_ok!(gate.whoami().await);

    match state {
        SessionState::Authenticated(session) => {
            assert_eq!(session.username.as_deref(), Some("admin"));
        }
        SessionState::Anonymous => panic!("expected an authenticated session"),
    }
}
