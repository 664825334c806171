//! Normalizing a snapshot into the values the resource panel shows.

use super::format::*;
use super::{ResourceSnapshot, ResourcesConfig};
use crate::status::Severity;

use serde::Serialize;

/// A percentage gauge. A missing reading has no severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub value: Option<f64>,
    pub display: String,
    pub severity: Option<Severity>,
}

impl Gauge {
    pub fn percent(value: Option<f64>) -> Self {
        Self {
            value: value.filter(|v| v.is_finite()),
            display: format_percent(value),
            severity: gauge_severity(value),
        }
    }

    pub fn temperature(celsius: Option<f64>) -> Self {
        Self {
            value: celsius.filter(|v| v.is_finite()),
            display: format_temperature(celsius),
            severity: gauge_severity(celsius),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuView {
    pub usage: Gauge,
    pub cores: Option<u32>,
    pub user: String,
    pub system: String,
    pub iowait: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryView {
    pub usage: Gauge,
    pub used: String,
    pub total: String,
}

impl MemoryView {
    /// `"used / total"`, or unavailable if either side is missing.
    pub fn detail(&self) -> String {
        if self.used == UNAVAILABLE || self.total == UNAVAILABLE {
            UNAVAILABLE.to_string()
        } else {
            format!("{} / {}", self.used, self.total)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureView {
    pub current: Gauge,
    pub min: String,
    pub max: String,
}

impl TemperatureView {
    pub fn range(&self) -> String {
        if self.min == UNAVAILABLE && self.max == UNAVAILABLE {
            UNAVAILABLE.to_string()
        } else {
            format!("{} – {}", self.min, self.max)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    pub rx: String,
    pub tx: String,
    pub total: String,
}

/// Everything the resource panel renders. A `None` section is hidden by
/// configuration and was never computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePanel {
    pub host: Option<String>,
    pub platform: Option<String>,
    pub cpu: Option<CpuView>,
    pub memory: Option<MemoryView>,
    pub temperature: Option<TemperatureView>,
    pub network: Option<NetworkView>,
}

/// Normalize a snapshot for display, honoring visibility.
///
/// Returns `None` when the whole panel is disabled.
pub fn normalize(snapshot: &ResourceSnapshot, config: &ResourcesConfig) -> Option<ResourcePanel> {
    if !config.enabled {
        return None;
    }

    let cpu = config.show_cpu.then(|| CpuView {
        usage: Gauge::percent(snapshot.cpu_percent),
        cores: snapshot.cpu_cores,
        user: format_percent(snapshot.cpu_user_percent),
        system: format_percent(snapshot.cpu_system_percent),
        iowait: format_percent(snapshot.cpu_iowait_percent),
    });

    let memory = config.show_memory.then(|| MemoryView {
        usage: Gauge::percent(snapshot.mem_percent),
        used: format_bytes(snapshot.mem_used_bytes),
        total: format_bytes(snapshot.mem_total_bytes),
    });

    let temperature = config.show_temperature.then(|| TemperatureView {
        current: Gauge::temperature(snapshot.temp_c),
        min: format_temperature(snapshot.temp_min_c),
        max: format_temperature(snapshot.temp_max_c),
    });

    let network = config.show_network.then(|| NetworkView {
        rx: format_rate(snapshot.net_rx_bytes_per_sec),
        tx: format_rate(snapshot.net_tx_bytes_per_sec),
        total: format_rate(network_total(
            snapshot.net_rx_bytes_per_sec,
            snapshot.net_tx_bytes_per_sec,
        )),
    });

    Some(ResourcePanel {
        host: snapshot.host.clone(),
        platform: snapshot.platform.clone(),
        cpu,
        memory,
        temperature,
        network,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cpu_and_warning_memory() {
        let snapshot = ResourceSnapshot {
            cpu_percent: None,
            mem_percent: Some(85.0),
            ..Default::default()
        };
        let panel = normalize(&snapshot, &ResourcesConfig::default()).unwrap();

        let cpu = panel.cpu.unwrap();
        assert_eq!(cpu.usage.display, UNAVAILABLE);
        assert_eq!(cpu.usage.severity, None);
        assert_eq!(cpu.usage.value, None);

        let memory = panel.memory.unwrap();
        assert_eq!(memory.usage.display, "85%");
        assert_eq!(memory.usage.severity, Some(Severity::Warning));
    }

    #[test]
    fn test_disabled_panel_computes_nothing() {
        let config = ResourcesConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(normalize(&ResourceSnapshot::default(), &config).is_none());
    }

    #[test]
    fn test_hidden_kinds_are_not_emitted() {
        let config = ResourcesConfig {
            show_cpu: false,
            show_network: false,
            ..Default::default()
        };
        let snapshot = ResourceSnapshot {
            cpu_percent: Some(99.0),
            net_rx_bytes_per_sec: Some(10.0),
            ..Default::default()
        };
        let panel = normalize(&snapshot, &config).unwrap();
        assert!(panel.cpu.is_none());
        assert!(panel.network.is_none());
        assert!(panel.memory.is_some());
        assert!(panel.temperature.is_some());
    }

    #[test]
    fn test_network_asymmetry() {
        let snapshot = ResourceSnapshot {
            net_rx_bytes_per_sec: Some(100.0),
            ..Default::default()
        };
        let network = normalize(&snapshot, &ResourcesConfig::default())
            .unwrap()
            .network
            .unwrap();
        assert_eq!(network.rx, "100 B/s");
        assert_eq!(network.tx, UNAVAILABLE);
        assert_eq!(network.total, "100 B/s");

        let network = normalize(&ResourceSnapshot::default(), &ResourcesConfig::default())
            .unwrap()
            .network
            .unwrap();
        assert_eq!(network.total, UNAVAILABLE);
    }

    #[test]
    fn test_memory_detail_and_temperature_range() {
        let snapshot = ResourceSnapshot {
            mem_used_bytes: Some(2.0 * 1024.0 * 1024.0 * 1024.0),
            mem_total_bytes: Some(8.0 * 1024.0 * 1024.0 * 1024.0),
            temp_c: Some(91.2),
            temp_min_c: Some(30.0),
            ..Default::default()
        };
        let panel = normalize(&snapshot, &ResourcesConfig::default()).unwrap();

        assert_eq!(panel.memory.unwrap().detail(), "2.00 GB / 8.00 GB");

        let temperature = panel.temperature.unwrap();
        assert_eq!(temperature.current.severity, Some(Severity::Critical));
        assert_eq!(temperature.range(), format!("30°C – {}", UNAVAILABLE));
    }
}
