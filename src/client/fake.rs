//! Scripted transport for unit tests.

use super::{Body, FetchError, RequestOptions, Transport};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&RequestOptions) -> Result<Body, FetchError> + Send + Sync>;

struct Route {
    prefix: String,
    delay: Duration,
    respond: Responder,
}

/// Answers requests from routes registered by path prefix. The most recently
/// registered matching route wins; unmatched paths fail as network errors.
#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(String, RequestOptions)>>,
    cookies: Mutex<HashMap<String, String>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(&self, prefix: &str, result: Result<Body, FetchError>) -> &Self {
        self.on_delayed(prefix, Duration::ZERO, result)
    }

    pub(crate) fn on_delayed(
        &self,
        prefix: &str,
        delay: Duration,
        result: Result<Body, FetchError>,
    ) -> &Self {
        self.on_with(prefix, delay, move |_| result.clone())
    }

    pub(crate) fn on_with<F>(&self, prefix: &str, delay: Duration, respond: F) -> &Self
    where
        F: Fn(&RequestOptions) -> Result<Body, FetchError> + Send + Sync + 'static,
    {
        self.routes.lock().unwrap().push(Route {
            prefix: prefix.to_string(),
            delay,
            respond: Box::new(respond),
        });
        self
    }

    pub(crate) fn set_cookie(&self, name: &str, value: &str) {
        self.cookies
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Number of requests issued whose path starts with `prefix`.
    pub(crate) fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .count()
    }

    pub(crate) fn last_call(&self, prefix: &str) -> Option<(String, RequestOptions)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(path, _)| path.starts_with(prefix))
            .cloned()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, path: &str, options: RequestOptions) -> Result<Body, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), options.clone()));

        let (delay, result) = {
            let routes = self.routes.lock().unwrap();
            match routes.iter().rev().find(|r| path.starts_with(&r.prefix)) {
                Some(route) => (route.delay, (route.respond)(&options)),
                None => (
                    Duration::ZERO,
                    Err(FetchError::Network(format!("no route for {}", path))),
                ),
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().unwrap().get(name).cloned()
    }
}
