//! Turning a sparse sample series into a complete window of buckets.

use super::{IncidentView, MetricsPayload, Resolution, UptimeSample};
use crate::status::Severity;

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Uptime at or above this is operational.
pub const OPERATIONAL_THRESHOLD: f64 = 99.0;
/// Uptime at or above this (and below operational) is degraded.
pub const DEGRADED_THRESHOLD: f64 = 50.0;

/// The calendar slot a bucket covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Period {
    Day(NaiveDate),
    Hour(DateTime<Utc>),
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            Period::Hour(hour) => write!(f, "{}", hour.format("%Y-%m-%d %H:00")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketClass {
    Unknown,
    Operational,
    Degraded,
    Down,
}

impl BucketClass {
    pub fn severity(&self) -> Severity {
        match self {
            BucketClass::Unknown => Severity::Neutral,
            BucketClass::Operational => Severity::Nominal,
            BucketClass::Degraded => Severity::Warning,
            BucketClass::Down => Severity::Critical,
        }
    }
}

/// Classify a single bucket's uptime.
pub fn classify_uptime(uptime_percent: Option<f64>) -> BucketClass {
    match uptime_percent {
        None => BucketClass::Unknown,
        Some(p) if p >= OPERATIONAL_THRESHOLD => BucketClass::Operational,
        Some(p) if p >= DEGRADED_THRESHOLD => BucketClass::Degraded,
        Some(_) => BucketClass::Down,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub period: Period,
    /// `None` when the backend had no data for this period.
    pub uptime_percent: Option<f64>,
    pub class: BucketClass,
}

/// Exactly `resolution.bucket_count()` buckets, oldest first, ending at the
/// current period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeWindow {
    pub service_key: String,
    pub resolution: Resolution,
    pub buckets: Vec<Bucket>,
}

impl UptimeWindow {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn unknown_count(&self) -> usize {
        self.buckets
            .iter()
            .filter(|b| b.class == BucketClass::Unknown)
            .count()
    }
}

/// Truncate a timestamp to the start of its containing window.
pub fn truncate_to_window(dt: DateTime<Utc>, window_seconds: i64) -> DateTime<Utc> {
    let ts = dt.timestamp();
    let truncated = ts - ts.rem_euclid(window_seconds);
    DateTime::from_timestamp(truncated, 0).unwrap_or(dt)
}

/// The periods a window covers, oldest first.
///
/// Daily windows end at today's date on the clock's calendar; hourly windows
/// end at the current UTC hour, matching how the backend bins hours.
pub fn window_periods(resolution: Resolution, now: DateTime<FixedOffset>) -> Vec<Period> {
    let count = resolution.bucket_count() as i64;

    match resolution {
        Resolution::Days(_) => {
            let today = now.date_naive();
            (0..count)
                .rev()
                .map(|i| Period::Day(today - ChronoDuration::days(i)))
                .collect()
        }
        Resolution::Hours(_) => {
            let hour = truncate_to_window(now.with_timezone(&Utc), 3600);
            (0..count)
                .rev()
                .map(|i| Period::Hour(hour - ChronoDuration::hours(i)))
                .collect()
        }
    }
}

/// Parse a sample's period string at the given resolution.
pub fn parse_period(raw: &str, resolution: Resolution) -> Option<Period> {
    match resolution {
        Resolution::Days(_) => {
            let date = raw.get(..10)?;
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(Period::Day)
        }
        Resolution::Hours(_) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| Period::Hour(truncate_to_window(dt.with_timezone(&Utc), 3600))),
    }
}

/// Build the uptime window for one service.
///
/// Missing periods become unknown buckets; nothing is interpolated or
/// zero-filled. Samples outside the window, with unparseable periods, or with
/// non-finite percentages do not contribute. For duplicate periods the later
/// sample wins. The result depends only on the arguments.
pub fn aggregate(
    service_key: &str,
    samples: &[UptimeSample],
    resolution: Resolution,
    now: DateTime<FixedOffset>,
) -> UptimeWindow {
    let mut lookup: HashMap<Period, Option<f64>> = HashMap::with_capacity(samples.len());

    for sample in samples {
        match parse_period(&sample.period, resolution) {
            Some(period) => {
                let pct = sample.uptime_percent.filter(|p| p.is_finite());
                lookup.insert(period, pct);
            }
            None => {
                tracing::debug!(
                    "Ignoring sample for {} with unparseable period {:?}",
                    service_key,
                    sample.period
                );
            }
        }
    }

    let buckets = window_periods(resolution, now)
        .into_iter()
        .map(|period| {
            let uptime_percent = lookup.get(&period).copied().flatten();
            Bucket {
                period,
                uptime_percent,
                class: classify_uptime(uptime_percent),
            }
        })
        .collect();

    UptimeWindow {
        service_key: service_key.to_string(),
        resolution,
        buckets,
    }
}

/// Everything the metrics channel renders, built fresh from one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub resolution: Resolution,
    pub windows: BTreeMap<String, UptimeWindow>,
    pub overall: BTreeMap<String, String>,
    pub incidents: Vec<IncidentView>,
}

impl MetricsView {
    /// Build the view for a payload fetched at `resolution`.
    ///
    /// `known_services` adds services the backend sent no samples for, so
    /// they still get a window of unknown buckets and an "N/A" summary.
    pub fn build<'a>(
        payload: &MetricsPayload,
        resolution: Resolution,
        now: DateTime<FixedOffset>,
        known_services: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        if let Some(served) = payload.served_resolution() {
            if served != resolution {
                tracing::debug!(
                    "Metrics served at {:?} but requested {:?}",
                    served,
                    resolution
                );
            }
        }

        let keys: BTreeSet<String> = payload
            .series
            .keys()
            .chain(payload.overall.keys())
            .cloned()
            .chain(known_services.into_iter().map(str::to_string))
            .collect();

        let mut windows = BTreeMap::new();
        let mut overall = BTreeMap::new();
        for key in keys {
            let samples = payload.series.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            windows.insert(key.clone(), aggregate(&key, samples, resolution, now));
            overall.insert(key.clone(), payload.overall_display(&key));
        }

        Self {
            resolution,
            windows,
            overall,
            incidents: payload.downs.iter().map(IncidentView::from).collect(),
        }
    }
}
