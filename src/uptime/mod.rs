//! Uptime history: backend payload types and the fixed-length window.

mod window;

pub use window::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest day window the backend will serve.
pub const MAX_DAYS: u32 = 365;
/// Largest hour window the backend will serve.
pub const MAX_HOURS: u32 = 24 * 365;

/// Shown instead of an overall percentage when a service has no samples.
pub const NO_UPTIME: &str = "N/A";

/// Window length and granularity of a metrics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Days(u32),
    Hours(u32),
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Days(7)
    }
}

impl Resolution {
    /// A daily window, clamped to what the backend accepts.
    pub fn days(n: u32) -> Self {
        Resolution::Days(n.clamp(1, MAX_DAYS))
    }

    /// An hourly window, clamped to what the backend accepts.
    pub fn hours(n: u32) -> Self {
        Resolution::Hours(n.clamp(1, MAX_HOURS))
    }

    /// Number of buckets in a window at this resolution.
    pub fn bucket_count(&self) -> usize {
        match self {
            Resolution::Days(n) | Resolution::Hours(n) => (*n).max(1) as usize,
        }
    }

    /// Query string for `GET /api/metrics`.
    pub fn query(&self) -> String {
        match self {
            Resolution::Days(n) => format!("days={}", n),
            Resolution::Hours(n) => format!("hours={}", n),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Resolution::Days(n) => format!("Last {}d", n),
            Resolution::Hours(n) => format!("Last {}h", n),
        }
    }
}

/// One aggregated sample from the backend.
///
/// The period is a date (`2024-05-01`) for daily series and an RFC 3339
/// hour (`2024-05-01T13:00:00Z`) for hourly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeSample {
    #[serde(rename = "day", alias = "hour")]
    pub period: String,
    #[serde(default, alias = "uptime")]
    pub uptime_percent: Option<f64>,
}

impl UptimeSample {
    pub fn new(period: impl Into<String>, uptime_percent: Option<f64>) -> Self {
        Self {
            period: period.into(),
            uptime_percent,
        }
    }

    /// Sample for a calendar day.
    pub fn day(day: NaiveDate, uptime_percent: Option<f64>) -> Self {
        Self::new(day.format("%Y-%m-%d").to_string(), uptime_percent)
    }
}

/// A failed probe recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub taken_at: String,
    pub service_key: String,
    #[serde(default)]
    pub http_status: Option<u16>,
}

/// Payload of `GET /api/metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsPayload {
    #[serde(default)]
    pub overall: BTreeMap<String, f64>,
    #[serde(default)]
    pub series: BTreeMap<String, Vec<UptimeSample>>,
    #[serde(default)]
    pub downs: Vec<IncidentRecord>,
    #[serde(default)]
    pub window_days: Option<u32>,
    #[serde(default)]
    pub window_hours: Option<u32>,
}

impl MetricsPayload {
    /// Resolution the backend says it answered with, if it said.
    pub fn served_resolution(&self) -> Option<Resolution> {
        match (self.window_days, self.window_hours) {
            (Some(d), _) => Some(Resolution::Days(d)),
            (None, Some(h)) => Some(Resolution::Hours(h)),
            (None, None) => None,
        }
    }

    /// Overall uptime display for a service, as reported by the backend.
    ///
    /// A service without samples shows [`NO_UPTIME`] rather than 0%.
    pub fn overall_display(&self, service_key: &str) -> String {
        let has_samples = self
            .series
            .get(service_key)
            .is_some_and(|s| !s.is_empty());

        match self.overall.get(service_key) {
            Some(pct) if has_samples && pct.is_finite() => format!("{:.1}%", pct),
            _ => NO_UPTIME.to_string(),
        }
    }
}

/// Incident line ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentView {
    pub at: Option<DateTime<Utc>>,
    pub when: String,
    pub service_key: String,
    pub status: String,
}

impl From<&IncidentRecord> for IncidentView {
    fn from(record: &IncidentRecord) -> Self {
        let at = DateTime::parse_from_rfc3339(&record.taken_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
        let when = at
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| record.taken_at.clone());
        let status = match record.http_status.filter(|s| *s != 0) {
            Some(code) => code.to_string(),
            None => "n/a".to_string(),
        };

        Self {
            at,
            when,
            service_key: record.service_key.clone(),
            status,
        }
    }
}
