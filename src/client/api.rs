//! Typed wrappers for the public backend endpoints.

use super::{FetchError, RequestOptions, Transport};
use crate::resources::ResourceSnapshot;
use crate::status::LivePayload;
use crate::uptime::{MetricsPayload, Resolution};

/// `GET /api/check`
pub async fn fetch_live(transport: &dyn Transport) -> Result<LivePayload, FetchError> {
    transport
        .request("/api/check", RequestOptions::get())
        .await?
        .json()
}

/// `GET /api/metrics?days=N` or `?hours=N`
pub async fn fetch_metrics(
    transport: &dyn Transport,
    resolution: Resolution,
) -> Result<MetricsPayload, FetchError> {
    let path = format!("/api/metrics?{}", resolution.query());
    transport.request(&path, RequestOptions::get()).await?.json()
}

/// `GET /api/resources`
pub async fn fetch_resources(transport: &dyn Transport) -> Result<ResourceSnapshot, FetchError> {
    transport
        .request("/api/resources", RequestOptions::get())
        .await?
        .json()
}
