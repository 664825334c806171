//! reqwest-backed transport.

use super::{Body, FetchError, RequestOptions, Transport};

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client bound to one backend.
///
/// Cookies persist across calls so the session and CSRF cookies handed out
/// at login are replayed on every later request.
pub struct RequestClient {
    base: Url,
    http: reqwest::Client,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl RequestClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = Url::parse(base_url)
            .map_err(|e| FetchError::Network(format!("invalid base url {}: {}", base_url, e)))?;

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            base,
            http,
            jar,
            timeout,
        })
    }

    async fn send(&self, url: Url, options: RequestOptions) -> Result<Body, FetchError> {
        let mut req = self
            .http
            .request(options.method, url)
            .header(CACHE_CONTROL, "no-store");

        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(json) = &options.json {
            req = req.json(json);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        // Read the full body first so error responses keep their payload
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let body = decode_body(is_json, text)?;

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Transport for RequestClient {
    async fn request(&self, path: &str, options: RequestOptions) -> Result<Body, FetchError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| FetchError::Network(format!("invalid path {}: {}", path, e)))?;

        tracing::trace!("{} {}", options.method, url);

        match tokio::time::timeout(self.timeout, self.send(url, options)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        find_cookie(cookies, name)
    }
}

/// Decode a response body according to its content type.
pub fn decode_body(is_json: bool, text: String) -> Result<Body, FetchError> {
    if !is_json {
        return Ok(Body::Text(text));
    }

    match serde_json::from_str(&text) {
        Ok(value) => Ok(Body::Json(value)),
        Err(e) => Err(FetchError::Decode {
            message: e.to_string(),
            raw: text,
        }),
    }
}

/// Pick one cookie value out of a `Cookie` header string.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
