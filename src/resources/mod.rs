//! Host-resource snapshot, its visibility config, and the normalized panel.

mod format;
mod panel;

pub use format::*;
pub use panel::*;

use serde::{Deserialize, Serialize};

/// Payload of `GET /api/resources`. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    #[serde(default)]
    pub cpu_user_percent: Option<f64>,
    #[serde(default)]
    pub cpu_system_percent: Option<f64>,
    #[serde(default)]
    pub cpu_iowait_percent: Option<f64>,
    #[serde(default)]
    pub mem_percent: Option<f64>,
    #[serde(default)]
    pub mem_used_bytes: Option<f64>,
    #[serde(default)]
    pub mem_total_bytes: Option<f64>,
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub temp_min_c: Option<f64>,
    #[serde(default)]
    pub temp_max_c: Option<f64>,
    #[serde(default)]
    pub net_rx_bytes_per_sec: Option<f64>,
    #[serde(default)]
    pub net_tx_bytes_per_sec: Option<f64>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Admin-owned visibility toggles for the resource panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub show_cpu: bool,
    #[serde(default = "default_true")]
    pub show_memory: bool,
    #[serde(default = "default_true")]
    pub show_temperature: bool,
    #[serde(default = "default_true")]
    pub show_network: bool,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_cpu: true,
            show_memory: true,
            show_temperature: true,
            show_network: true,
        }
    }
}
