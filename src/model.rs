//! Render model written by the scheduler and read by a renderer.
//!
//! Each channel owns exactly one region and always replaces it wholesale.

use crate::resources::{ResourcePanel, ResourcesConfig};
use crate::status::{classify, Classification, ProbeResult, ServiceState};
use crate::uptime::{MetricsView, Resolution};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// State of one render region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum Region<T> {
    /// Nothing fetched yet.
    Pending,
    Ready(T),
    Unavailable(String),
}

impl<T> Default for Region<T> {
    fn default() -> Self {
        Region::Pending
    }
}

impl<T> Region<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Region::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Region::Unavailable(_))
    }
}

/// Live status region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveView {
    pub updated: DateTime<Utc>,
    pub services: BTreeMap<String, ServiceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub probe: ProbeResult,
    pub classification: Classification,
}

impl ServiceStatus {
    pub fn new(probe: ProbeResult) -> Self {
        let classification = classify(Some(&probe));
        Self {
            probe,
            classification,
        }
    }
}

impl LiveView {
    pub fn from_probes(updated: DateTime<Utc>, probes: BTreeMap<String, ProbeResult>) -> Self {
        Self {
            updated,
            services: probes
                .into_iter()
                .map(|(key, probe)| (key, ServiceStatus::new(probe)))
                .collect(),
        }
    }

    pub fn state_of(&self, service_key: &str) -> Option<ServiceState> {
        self.services
            .get(service_key)
            .map(|s| s.classification.state)
    }
}

/// Resource region. `None` means the panel is hidden by configuration.
pub type ResourcesView = Option<ResourcePanel>;

/// The full render model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardModel {
    pub live: Region<LiveView>,
    pub metrics: Region<MetricsView>,
    pub resources: Region<ResourcesView>,
}

/// Shared selection state the scheduler reads at the start of each poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardContext {
    pub resolution: Resolution,
    pub resources_config: ResourcesConfig,
}

impl DashboardContext {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }
}
