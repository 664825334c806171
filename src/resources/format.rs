//! Formatting and thresholds for host-resource values.

use crate::status::Severity;

/// Shown for any value the host did not report.
pub const UNAVAILABLE: &str = "unavailable";

/// Gauge value at or above which the gauge is critical.
pub const CRITICAL_THRESHOLD: f64 = 90.0;
/// Gauge value at or above which the gauge is a warning.
pub const WARNING_THRESHOLD: f64 = 75.0;

const BYTE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Round to `decimals` places with ties away from zero, so `42.5` shows as
/// `43` rather than the float formatter's `42`.
fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Format a byte count with binary (1024) prefixes.
///
/// Plain bytes get no decimals, KB and MB one, GB and above two.
pub fn format_bytes(bytes: Option<f64>) -> String {
    let Some(mut value) = present(bytes).filter(|b| *b >= 0.0) else {
        return UNAVAILABLE.to_string();
    };

    let mut tier = 0;
    while value >= 1024.0 && tier < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        tier += 1;
    }

    let unit = BYTE_UNITS[tier];
    match tier {
        0 => format!("{:.0} {}", round_half_up(value, 0), unit),
        1 | 2 => format!("{:.1} {}", round_half_up(value, 1), unit),
        _ => format!("{:.2} {}", round_half_up(value, 2), unit),
    }
}

/// Format a byte rate, e.g. `"1.5 MB/s"`.
pub fn format_rate(bytes_per_sec: Option<f64>) -> String {
    match present(bytes_per_sec).filter(|b| *b >= 0.0) {
        Some(rate) => format!("{}/s", format_bytes(Some(rate))),
        None => UNAVAILABLE.to_string(),
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match present(value) {
        Some(v) => format!("{:.0}%", round_half_up(v, 0)),
        None => UNAVAILABLE.to_string(),
    }
}

pub fn format_temperature(celsius: Option<f64>) -> String {
    match present(celsius) {
        Some(v) => format!("{:.0}°C", round_half_up(v, 0)),
        None => UNAVAILABLE.to_string(),
    }
}

/// Severity of a gauge reading; a missing reading clears the gauge.
pub fn gauge_severity(value: Option<f64>) -> Option<Severity> {
    let value = present(value)?;
    Some(if value >= CRITICAL_THRESHOLD {
        Severity::Critical
    } else if value >= WARNING_THRESHOLD {
        Severity::Warning
    } else {
        Severity::Nominal
    })
}

/// Combined network throughput.
///
/// Unavailable only when both directions are missing; a single missing
/// direction counts as zero.
pub fn network_total(rx: Option<f64>, tx: Option<f64>) -> Option<f64> {
    match (present(rx), present(tx)) {
        (None, None) => None,
        (rx, tx) => Some(rx.unwrap_or(0.0) + tx.unwrap_or(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_tiers() {
        assert_eq!(format_bytes(Some(0.0)), "0 B");
        assert_eq!(format_bytes(Some(1023.0)), "1023 B");
        assert_eq!(format_bytes(Some(1024.0)), "1.0 KB");
        assert_eq!(format_bytes(Some(1536.0)), "1.5 KB");
        assert_eq!(format_bytes(Some(1024.0 * 1024.0)), "1.0 MB");
        assert_eq!(format_bytes(Some(3.0 * 1024.0 * 1024.0 * 1024.0)), "3.00 GB");
        assert_eq!(format_bytes(Some(1024f64.powi(4) * 2.5)), "2.50 TB");
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        assert_eq!(format_percent(Some(42.5)), "43%");
        assert_eq!(format_temperature(Some(54.5)), "55°C");
        assert_eq!(format_bytes(Some(1280.0)), "1.3 KB");
        assert_eq!(format_bytes(Some(2.5)), "3 B");
        assert_eq!(format_bytes(Some(1024f64.powi(3) * 1.125)), "1.13 GB");
    }

    #[test]
    fn test_format_bytes_stops_at_largest_unit() {
        assert_eq!(format_bytes(Some(1024f64.powi(6))), "1024.00 PB");
    }

    #[test]
    fn test_format_bytes_missing() {
        assert_eq!(format_bytes(None), UNAVAILABLE);
        assert_eq!(format_bytes(Some(f64::NAN)), UNAVAILABLE);
        assert_eq!(format_bytes(Some(-1.0)), UNAVAILABLE);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(Some(2048.0)), "2.0 KB/s");
        assert_eq!(format_rate(Some(0.0)), "0 B/s");
        assert_eq!(format_rate(None), UNAVAILABLE);
    }

    #[test]
    fn test_percent_and_temperature() {
        assert_eq!(format_percent(Some(42.4)), "42%");
        assert_eq!(format_percent(Some(0.0)), "0%");
        assert_eq!(format_percent(None), UNAVAILABLE);
        assert_eq!(format_percent(Some(f64::NAN)), UNAVAILABLE);
        assert_eq!(format_temperature(Some(54.6)), "55°C");
        assert_eq!(format_temperature(None), UNAVAILABLE);
    }

    #[test]
    fn test_gauge_severity() {
        assert_eq!(gauge_severity(Some(95.0)), Some(Severity::Critical));
        assert_eq!(gauge_severity(Some(90.0)), Some(Severity::Critical));
        assert_eq!(gauge_severity(Some(85.0)), Some(Severity::Warning));
        assert_eq!(gauge_severity(Some(75.0)), Some(Severity::Warning));
        assert_eq!(gauge_severity(Some(74.9)), Some(Severity::Nominal));
        assert_eq!(gauge_severity(None), None);
    }

    #[test]
    fn test_network_total() {
        assert_eq!(network_total(Some(100.0), None), Some(100.0));
        assert_eq!(network_total(None, Some(50.0)), Some(50.0));
        assert_eq!(network_total(Some(100.0), Some(50.0)), Some(150.0));
        assert_eq!(network_total(None, None), None);
    }
}
