//! Live service status and its classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shown wherever a latency is not available.
pub const NO_LATENCY: &str = "—";

/// One health check of a monitored service as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(default)]
    pub service_key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ok: bool,
    /// HTTP status of the probe; the backend sends 0 when nothing answered.
    #[serde(default, rename = "status", alias = "http_status")]
    pub http_status: Option<u16>,
    #[serde(default, rename = "ms", alias = "latency_ms")]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl ProbeResult {
    /// HTTP status, treating the backend's 0 as "no response".
    pub fn status_code(&self) -> Option<u16> {
        self.http_status.filter(|s| *s != 0)
    }
}

/// Payload of `GET /api/check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivePayload {
    pub t: DateTime<Utc>,
    #[serde(default)]
    pub status: BTreeMap<String, ProbeResult>,
}

impl LivePayload {
    /// Probes keyed by service, with `service_key` filled in from the map key.
    pub fn into_probes(self) -> BTreeMap<String, ProbeResult> {
        self.status
            .into_iter()
            .map(|(key, mut probe)| {
                probe.service_key = key.clone();
                (key, probe)
            })
            .collect()
    }
}

/// Classified state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceState {
    Up,
    Down,
    Degraded,
    Disabled,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Up => "UP",
            ServiceState::Down => "DOWN",
            ServiceState::Degraded => "DEGRADED",
            ServiceState::Disabled => "DISABLED",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display severity shared by status pills, uptime buckets and gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Neutral,
    Nominal,
    Warning,
    Critical,
}

/// Result of classifying one probe, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub state: ServiceState,
    pub severity: Severity,
    pub label: String,
    pub latency: String,
    pub monitoring_enabled: bool,
}

/// Classify a probe. `None` means no response was received at all.
///
/// Precedence is disabled, then not ok, then degraded, then up.
pub fn classify(probe: Option<&ProbeResult>) -> Classification {
    let empty = ProbeResult::default();
    let probe = probe.unwrap_or(&empty);

    if probe.disabled {
        return Classification {
            state: ServiceState::Disabled,
            severity: Severity::Neutral,
            label: "Monitoring disabled".to_string(),
            latency: NO_LATENCY.to_string(),
            monitoring_enabled: false,
        };
    }

    let (state, severity) = if !probe.ok {
        (ServiceState::Down, Severity::Critical)
    } else if probe.degraded {
        (ServiceState::Degraded, Severity::Warning)
    } else {
        (ServiceState::Up, Severity::Nominal)
    };

    let label = match probe.status_code() {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    };

    Classification {
        state,
        severity,
        label,
        latency: format_latency(probe.latency_ms),
        monitoring_enabled: true,
    }
}

/// Format a latency in milliseconds, or the [`NO_LATENCY`] sentinel.
pub fn format_latency(ms: Option<u64>) -> String {
    match ms {
        Some(ms) => format!("{} ms", ms),
        None => NO_LATENCY.to_string(),
    }
}
