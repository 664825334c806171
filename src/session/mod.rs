//! Admin session gate.
//!
//! Tracks whether the client is logged in, owns the CSRF token, and is the
//! only path admin calls take to the backend. Any 401 from an admin call
//! drops the session.

mod admin;

pub use admin::*;

use crate::client::{Body, FetchError, RequestOptions, Transport, CSRF_COOKIE, CSRF_HEADER};

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    pub authenticated: bool,
    pub username: Option<String>,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(AdminSession),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Why a login attempt failed. Every variant leaves the form usable.
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Access denied - too many failed attempts. Try again later.")]
    RateLimited,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Request timeout - check your connection")]
    Timeout,
    #[error("Login failed: {0}")]
    Failed(FetchError),
}

impl LoginError {
    fn from_fetch(err: FetchError) -> Self {
        match err.status() {
            Some(403) => LoginError::RateLimited,
            Some(401) => LoginError::InvalidCredentials,
            _ if err.is_timeout() => LoginError::Timeout,
            _ => LoginError::Failed(err),
        }
    }

    /// Whether trying again right away can succeed.
    pub fn retry_now(&self) -> bool {
        !matches!(self, LoginError::RateLimited)
    }
}

/// Errors from admin operations.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("session expired, please log in again")]
    SessionExpired,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, Deserialize)]
struct WhoAmI {
    authenticated: bool,
    #[serde(default)]
    user: Option<String>,
}

/// Authentication state plus the admin request path.
pub struct Gate {
    transport: Arc<dyn Transport>,
    state: RwLock<SessionState>,
}

impl Gate {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: RwLock::new(SessionState::Anonymous),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// CSRF token of the current session, if logged in.
    pub async fn csrf_token(&self) -> Option<String> {
        match &*self.state.read().await {
            SessionState::Authenticated(session) => Some(session.csrf_token.clone()),
            SessionState::Anonymous => None,
        }
    }

    fn cookie_token(&self) -> String {
        self.transport.cookie(CSRF_COOKIE).unwrap_or_default()
    }

    /// `POST /api/login`.
    ///
    /// On success the CSRF token is taken from the cookie the backend sets
    /// alongside the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<AdminSession, LoginError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let options = RequestOptions::post()
            .header(CSRF_HEADER, &self.cookie_token())
            .json(json!({ "username": username, "password": password }));

        if let Err(e) = self.transport.request("/api/login", options).await {
            let err = LoginError::from_fetch(e);
            tracing::warn!("Login failed for {}: {}", username, err);
            return Err(err);
        }

        let csrf_token = self.cookie_token();
        if csrf_token.is_empty() {
            tracing::warn!("Login succeeded but the backend set no {} cookie", CSRF_COOKIE);
        }

        let session = AdminSession {
            authenticated: true,
            username: Some(username.to_string()),
            csrf_token,
        };
        *self.state.write().await = SessionState::Authenticated(session.clone());
        tracing::info!("Logged in as {}", username);

        Ok(session)
    }

    /// `POST /api/logout`. Always ends anonymous, even if the call fails.
    pub async fn logout(&self) {
        let options = RequestOptions::post().header(CSRF_HEADER, &self.cookie_token());
        if let Err(e) = self.transport.request("/api/logout", options).await {
            tracing::debug!("Logout request failed: {}", e);
        }
        self.invalidate().await;
    }

    /// `GET /api/me`. Brings the gate in line with the server's view of the
    /// session.
    pub async fn whoami(&self) -> Result<SessionState, FetchError> {
        let me: WhoAmI = self
            .transport
            .request("/api/me", RequestOptions::get())
            .await?
            .json()?;

        let next = if me.authenticated {
            SessionState::Authenticated(AdminSession {
                authenticated: true,
                username: me.user,
                csrf_token: self.cookie_token(),
            })
        } else {
            SessionState::Anonymous
        };

        *self.state.write().await = next.clone();
        Ok(next)
    }

    async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if state.is_authenticated() {
            tracing::info!("Admin session ended");
        }
        *state = SessionState::Anonymous;
    }

    /// Issue an admin call. Mutating calls carry the CSRF header.
    pub async fn admin_request(&self, path: &str, options: RequestOptions) -> Result<Body, AdminError> {
        let token = self.csrf_token().await.ok_or(AdminError::NotAuthenticated)?;

        let options = if options.is_mutating() {
            options.header(CSRF_HEADER, &token)
        } else {
            options
        };

        match self.transport.request(path, options).await {
            Ok(body) => Ok(body),
            Err(FetchError::Http { status: 401, .. }) => {
                tracing::warn!("Admin call {} was rejected as unauthorized", path);
                self.invalidate().await;
                Err(AdminError::SessionExpired)
            }
            Err(FetchError::Http { status: 403, body }) => Err(AdminError::Forbidden(
                body.message().unwrap_or_else(|| "forbidden".to_string()),
            )),
            Err(e) => Err(AdminError::Fetch(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeTransport;

    fn gate_with(fake: FakeTransport) -> (Arc<FakeTransport>, Gate) {
        let fake = Arc::new(fake);
        let gate = Gate::new(fake.clone());
        (fake, gate)
    }

    fn http(status: u16, text: &str) -> FetchError {
        FetchError::Http {
            status,
            body: Body::Text(text.to_string()),
        }
    }

    #[tokio::test]
    async fn test_login_captures_csrf_cookie() {
        let fake = FakeTransport::new();
        fake.on("/api/login", Ok(Body::Json(json!({"ok": true}))));
        fake.set_cookie(CSRF_COOKIE, "tok-1");
        let (_, gate) = gate_with(fake);

        let session = gate.login("admin", "secret").await.unwrap();
        assert_eq!(session.csrf_token, "tok-1");
        assert_eq!(session.username.as_deref(), Some("admin"));
        assert!(gate.is_authenticated().await);
        assert_eq!(gate.csrf_token().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_login_failure_reasons() {
        let fake = FakeTransport::new();
        fake.on("/api/login", Err(http(401, "unauthorized")));
        let (fake, gate) = gate_with(fake);

        let err = gate.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
        assert!(err.retry_now());

        fake.on("/api/login", Err(http(403, "access denied - too many failed attempts")));
        let err = gate.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, LoginError::RateLimited));
        assert!(!err.retry_now());
        assert_eq!(
            err.to_string(),
            "Access denied - too many failed attempts. Try again later."
        );

        fake.on("/api/login", Err(FetchError::Timeout(crate::client::DEFAULT_REQUEST_TIMEOUT)));
        let err = gate.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, LoginError::Timeout));

        assert!(!gate.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let (fake, gate) = gate_with(FakeTransport::new());
        assert!(matches!(
            gate.login("  ", "pw").await,
            Err(LoginError::MissingCredentials)
        ));
        assert!(matches!(
            gate.login("admin", "").await,
            Err(LoginError::MissingCredentials)
        ));
        assert_eq!(fake.calls_to("/api/login"), 0);
    }

    #[tokio::test]
    async fn test_admin_call_attaches_csrf_and_401_ends_session() {
        let fake = FakeTransport::new();
        fake.on("/api/login", Ok(Body::Json(json!({"ok": true}))));
        fake.on("/api/admin/ingest-now", Ok(Body::Json(json!({"saved": true}))));
        fake.set_cookie(CSRF_COOKIE, "tok-2");
        let (fake, gate) = gate_with(fake);

        gate.login("admin", "secret").await.unwrap();
        gate.admin_request("/api/admin/ingest-now", RequestOptions::post())
            .await
            .unwrap();
        let (_, options) = fake.last_call("/api/admin/ingest-now").unwrap();
        assert_eq!(options.header_value(CSRF_HEADER), Some("tok-2"));

        fake.on("/api/admin/ingest-now", Err(http(401, "unauthorized")));
        let err = gate
            .admin_request("/api/admin/ingest-now", RequestOptions::post())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::SessionExpired));
        assert_eq!(gate.state().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_admin_403_keeps_session() {
        let fake = FakeTransport::new();
        fake.on("/api/login", Ok(Body::Json(json!({"ok": true}))));
        fake.on("/api/admin/reset-recent", Err(http(403, "forbidden")));
        let (_, gate) = gate_with(fake);

        gate.login("admin", "secret").await.unwrap();
        let err = gate
            .admin_request("/api/admin/reset-recent", RequestOptions::post())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Forbidden(ref m) if m == "forbidden"));
        assert!(gate.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_admin_call_while_anonymous_is_local_error() {
        let (fake, gate) = gate_with(FakeTransport::new());
        let err = gate
            .admin_request("/api/admin/ingest-now", RequestOptions::post())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotAuthenticated));
        assert_eq!(fake.calls_to("/api/admin"), 0);
    }

    #[tokio::test]
    async fn test_whoami_and_logout() {
        let fake = FakeTransport::new();
        fake.on(
            "/api/me",
            Ok(Body::Json(json!({"authenticated": true, "user": "admin"}))),
        );
        fake.on("/api/logout", Err(FetchError::Network("reset".into())));
        fake.set_cookie(CSRF_COOKIE, "tok-3");
        let (_, gate) = gate_with(fake);

        match gate.whoami().await.unwrap() {
            SessionState::Authenticated(s) => {
                assert_eq!(s.username.as_deref(), Some("admin"));
                assert_eq!(s.csrf_token, "tok-3");
            }
            other => panic!("unexpected state: {other:?}"),
        }

        gate.logout().await;
        assert!(!gate.is_authenticated().await);
    }
}
