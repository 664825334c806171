//! Configuration for the dashboard client.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::client::DEFAULT_REQUEST_TIMEOUT;
use crate::scheduler::DEFAULT_REFRESH_INTERVAL;
use crate::uptime::Resolution;

use std::env;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (default: "http://127.0.0.1:8080")
    pub base_url: String,
    /// Interval between refresh cycles (default: 15s)
    pub refresh_interval: Duration,
    /// Budget for a single request (default: 10s)
    pub request_timeout: Duration,
    /// Uptime window shown on startup (default: 7 days)
    pub resolution: Resolution,
    /// Admin credentials; when both are set the client logs in at startup
    pub admin_user: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            resolution: Resolution::default(),
            admin_user: None,
            admin_password: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STATUSBOARD_BASE_URL`: backend URL
    /// - `STATUSBOARD_REFRESH_SECS`: refresh interval in seconds (default: 15)
    /// - `STATUSBOARD_TIMEOUT_SECS`: request budget in seconds (default: 10)
    /// - `STATUSBOARD_WINDOW_DAYS`: uptime window length (default: 7)
    /// - `STATUSBOARD_ADMIN_USER` / `STATUSBOARD_ADMIN_PASSWORD`: optional admin login
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparseable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("STATUSBOARD_BASE_URL") {
            cfg.base_url = url;
        }

        if let Some(secs) = lookup("STATUSBOARD_REFRESH_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.refresh_interval = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = lookup("STATUSBOARD_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(days) = lookup("STATUSBOARD_WINDOW_DAYS").and_then(|s| s.parse().ok()) {
            cfg.resolution = Resolution::days(days);
        }

        cfg.admin_user = lookup("STATUSBOARD_ADMIN_USER").filter(|s| !s.is_empty());
        cfg.admin_password = lookup("STATUSBOARD_ADMIN_PASSWORD").filter(|s| !s.is_empty());

        cfg
    }

    /// Admin credentials, if both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        Some((self.admin_user.as_deref()?, self.admin_password.as_deref()?))
    }
}
