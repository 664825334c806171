//! Request layer for talking to the status backend.
//!
//! Every call is bounded by a fixed budget, reads the body before looking at
//! the status code, and reports failures through [`FetchError`].

mod api;
mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use api::*;
pub use http::*;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Default budget for a single request, body included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the cookie the backend uses to hand out the CSRF token.
pub const CSRF_COOKIE: &str = "csrf";

/// Header the CSRF token is echoed back in on mutating calls.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

impl Body {
    /// Decode the body into a typed payload.
    ///
    /// A plain-text body or a JSON value of the wrong shape is a
    /// [`FetchError::Decode`].
    pub fn json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        match self {
            Body::Json(value) => {
                let raw = value.to_string();
                serde_json::from_value(value).map_err(|e| FetchError::Decode {
                    message: e.to_string(),
                    raw,
                })
            }
            Body::Text(raw) => Err(FetchError::Decode {
                message: "expected a JSON body".to_string(),
                raw,
            }),
        }
    }

    /// Best-effort human readable message carried by the body.
    ///
    /// Looks for a `message` field on JSON bodies and falls back to the raw
    /// text otherwise.
    pub fn message(&self) -> Option<String> {
        match self {
            Body::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            Body::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// Request error types.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {status}")]
    Http { status: u16, body: Body },
    #[error("failed to decode response: {message}")]
    Decode { message: String, raw: String },
}

impl FetchError {
    /// HTTP status for [`FetchError::Http`], `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// Options for a single request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            json: None,
        }
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::get()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Whether the request changes server state and so needs a CSRF token.
    pub fn is_mutating(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Value of a header previously set on these options.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The seam the gate and the scheduler talk to the backend through.
///
/// [`RequestClient`] is the production implementation; tests substitute a
/// scripted transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request against a backend path such as `/api/check`.
    async fn request(&self, path: &str, options: RequestOptions) -> Result<Body, FetchError>;

    /// Current value of a cookie set by the backend.
    fn cookie(&self, name: &str) -> Option<String>;
}
