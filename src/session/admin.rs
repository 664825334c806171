//! Admin operations behind the gate.

use super::{AdminError, Gate};
use crate::client::{FetchError, RequestOptions};
use crate::resources::ResourcesConfig;
use crate::status::ProbeResult;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

/// Email alert configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default)]
    pub alert_email: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default = "default_true")]
    pub alert_on_down: bool,
    #[serde(default = "default_true")]
    pub alert_on_degraded: bool,
    #[serde(default)]
    pub alert_on_up: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
            alert_email: String::new(),
            from_email: String::new(),
            alert_on_down: true,
            alert_on_degraded: true,
            alert_on_up: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToggleResult {
    pub service: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestResult {
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub t: Option<DateTime<Utc>>,
}

/// An IP blocked after repeated failed logins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub ip: String,
    #[serde(default)]
    pub blocked_at: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlockList {
    #[serde(default)]
    blocks: Vec<BlockRecord>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cleared {
    #[serde(default)]
    cleared: u64,
}

fn post_json(body: Value) -> RequestOptions {
    RequestOptions::post().json(body)
}

impl Gate {
    /// `POST /api/admin/toggle-monitoring`
    pub async fn toggle_monitoring(&self, service: &str, enable: bool) -> Result<ToggleResult, AdminError> {
        let result: ToggleResult = self
            .admin_request(
                "/api/admin/toggle-monitoring",
                post_json(json!({ "service": service, "enable": enable })),
            )
            .await?
            .json()?;

        tracing::info!(
            "Monitoring {} for {}",
            if result.enabled { "enabled" } else { "disabled" },
            result.service
        );
        Ok(result)
    }

    /// `POST /api/admin/check`: probe one service right now.
    pub async fn force_check(&self, service: &str) -> Result<ProbeResult, AdminError> {
        let mut probe: ProbeResult = self
            .admin_request("/api/admin/check", post_json(json!({ "service": service })))
            .await?
            .json()?;
        probe.service_key = service.to_string();
        Ok(probe)
    }

    /// `POST /api/admin/ingest-now`: record a sample for every enabled service.
    pub async fn ingest_now(&self) -> Result<IngestResult, AdminError> {
        Ok(self
            .admin_request("/api/admin/ingest-now", RequestOptions::post())
            .await?
            .json()?)
    }

    /// `POST /api/admin/reset-recent`: drop incidents from the last 24h.
    pub async fn reset_recent(&self) -> Result<(), AdminError> {
        self.admin_request("/api/admin/reset-recent", RequestOptions::post())
            .await?;
        Ok(())
    }

    pub async fn alerts_config(&self) -> Result<AlertsConfig, AdminError> {
        Ok(self
            .admin_request("/api/admin/alerts/config", RequestOptions::get())
            .await?
            .json()?)
    }

    /// Save the alert config and return it as the backend now reports it.
    pub async fn save_alerts_config(&self, config: &AlertsConfig) -> Result<AlertsConfig, AdminError> {
        let body = serde_json::to_value(config).map_err(|e| AdminError::Rejected(e.to_string()))?;
        let outcome: Outcome = self
            .admin_request("/api/admin/alerts/config", post_json(body))
            .await?
            .json()?;
        if !outcome.success {
            return Err(AdminError::Rejected(
                outcome.message.unwrap_or_else(|| "save failed".to_string()),
            ));
        }
        self.alerts_config().await
    }

    /// `POST /api/admin/alerts/test`. Returns the backend's message.
    ///
    /// A failed send comes back as an error status; its message is surfaced
    /// as [`AdminError::Rejected`].
    pub async fn send_test_alert(&self) -> Result<String, AdminError> {
        let body = match self
            .admin_request("/api/admin/alerts/test", RequestOptions::post())
            .await
        {
            Ok(body) => body,
            Err(AdminError::Fetch(FetchError::Http { status, body })) => {
                let message = body
                    .message()
                    .unwrap_or_else(|| format!("test alert failed with HTTP {}", status));
                tracing::warn!("Test alert failed: {}", message);
                return Err(AdminError::Rejected(message));
            }
            Err(e) => return Err(e),
        };
        let outcome: Outcome = body.json()?;
        let message = outcome
            .message
            .unwrap_or_else(|| "Test email sent successfully".to_string());
        if outcome.success {
            Ok(message)
        } else {
            Err(AdminError::Rejected(message))
        }
    }

    pub async fn resources_config(&self) -> Result<ResourcesConfig, AdminError> {
        Ok(self
            .admin_request("/api/admin/resources/config", RequestOptions::get())
            .await?
            .json()?)
    }

    /// Save the resource panel config and return it as the backend now reports it.
    pub async fn save_resources_config(
        &self,
        config: &ResourcesConfig,
    ) -> Result<ResourcesConfig, AdminError> {
        let body = serde_json::to_value(config).map_err(|e| AdminError::Rejected(e.to_string()))?;
        self.admin_request("/api/admin/resources/config", post_json(body))
            .await?;
        self.resources_config().await
    }

    /// `GET /api/admin/blocks`
    pub async fn list_blocks(&self) -> Result<Vec<BlockRecord>, AdminError> {
        let list: BlockList = self
            .admin_request("/api/admin/blocks", RequestOptions::get())
            .await?
            .json()?;
        Ok(list.blocks)
    }

    /// `POST /api/admin/unblock`
    pub async fn unblock(&self, ip: &str) -> Result<(), AdminError> {
        self.admin_request("/api/admin/unblock", post_json(json!({ "ip": ip })))
            .await?;
        tracing::info!("Unblocked {}", ip);
        Ok(())
    }

    /// `POST /api/admin/clear-blocks`. Returns how many blocks were removed.
    pub async fn clear_blocks(&self) -> Result<u64, AdminError> {
        let cleared: Cleared = self
            .admin_request("/api/admin/clear-blocks", RequestOptions::post())
            .await?
            .json()?;
        Ok(cleared.cleared)
    }
}
