//! Refresh scheduler driving the three polling channels.
//!
//! Every tick starts live status, metrics and resources as independent
//! tasks. A channel that fails marks only its own region unavailable. Cycles
//! are never cancelled, so a slow channel may still be in flight when the
//! next tick fires; whichever completion lands last owns the region.

use crate::client::{fetch_live, fetch_metrics, fetch_resources, Transport};
use crate::clock::Clock;
use crate::model::{DashboardContext, DashboardModel, LiveView, Region, ServiceStatus};
use crate::resources::{normalize, ResourcesConfig};
use crate::session::{AdminError, Gate, IngestResult, ToggleResult};
use crate::status::{Classification, ServiceState};
use crate::uptime::{MetricsView, Resolution};

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// Default time between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ForceCheckError {
    #[error("Cannot check disabled services ({0})")]
    Disabled(String),
    #[error(transparent)]
    Admin(#[from] AdminError),
}

/// Periodic and on-demand refresh of the dashboard model.
#[derive(Clone)]
pub struct RefreshScheduler {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    model: Arc<RwLock<DashboardModel>>,
    context: Arc<RwLock<DashboardContext>>,
    interval: Duration,
    stop_tx: Arc<RwLock<Option<broadcast::Sender<()>>>>,
}

impl RefreshScheduler {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        context: DashboardContext,
        interval: Duration,
    ) -> Self {
        Self {
            transport,
            clock,
            model: Arc::new(RwLock::new(DashboardModel::default())),
            context: Arc::new(RwLock::new(context)),
            interval,
            stop_tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Snapshot of the render model.
    pub async fn model(&self) -> DashboardModel {
        self.model.read().await.clone()
    }

    pub async fn context(&self) -> DashboardContext {
        self.context.read().await.clone()
    }

    /// Start the periodic driver. The first cycle runs immediately.
    ///
    /// Starting again replaces the previous driver.
    pub async fn start(&self) -> JoinHandle<()> {
        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        if let Some(previous) = self.stop_tx.write().await.replace(stop_tx) {
            let _ = previous.send(());
        }

        tracing::info!(
            "Starting refresh scheduler with a {:?} interval",
            self.interval
        );

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        break;
                    }
                    _ = interval.tick() => {
                        scheduler.spawn_cycle();
                    }
                }
            }

            tracing::info!("Refresh scheduler stopped");
        })
    }

    /// Stop the periodic driver. Requests already in flight still land.
    pub async fn stop(&self) {
        if let Some(stop_tx) = self.stop_tx.write().await.take() {
            let _ = stop_tx.send(());
        }
    }

    fn spawn_cycle(&self) {
        let live = self.clone();
        tokio::spawn(async move { live.poll_live().await });

        let metrics = self.clone();
        tokio::spawn(async move { metrics.poll_metrics().await });

        let resources = self.clone();
        tokio::spawn(async move { resources.poll_resources().await });
    }

    /// Run one full cycle and wait for all three channels.
    pub async fn refresh_all(&self) {
        tokio::join!(self.poll_live(), self.poll_metrics(), self.poll_resources());
    }

    pub async fn poll_live(&self) {
        let region = match fetch_live(self.transport.as_ref()).await {
            Ok(payload) => {
                let updated = payload.t;
                let view = LiveView::from_probes(updated, payload.into_probes());
                tracing::debug!("Live status updated for {} services", view.services.len());
                Region::Ready(view)
            }
            Err(e) => {
                tracing::warn!("Live status refresh failed: {}", e);
                Region::Unavailable(e.to_string())
            }
        };

        self.model.write().await.live = region;
    }

    /// Fetch metrics at the resolution selected when the poll starts.
    pub async fn poll_metrics(&self) {
        let resolution = self.context.read().await.resolution;

        let region = match fetch_metrics(self.transport.as_ref(), resolution).await {
            Ok(payload) => {
                let known: Vec<String> = self
                    .model
                    .read()
                    .await
                    .live
                    .ready()
                    .map(|live| live.services.keys().cloned().collect())
                    .unwrap_or_default();

                let view = MetricsView::build(
                    &payload,
                    resolution,
                    self.clock.now(),
                    known.iter().map(String::as_str),
                );
                tracing::debug!(
                    "Metrics updated at {} for {} services",
                    resolution.label(),
                    view.windows.len()
                );
                Region::Ready(view)
            }
            Err(e) => {
                tracing::warn!("Metrics refresh failed: {}", e);
                Region::Unavailable(e.to_string())
            }
        };

        self.model.write().await.metrics = region;
    }

    /// Fetch resources, unless the panel is disabled altogether.
    pub async fn poll_resources(&self) {
        let config = self.context.read().await.resources_config.clone();

        let region = if !config.enabled {
            Region::Ready(None)
        } else {
            match fetch_resources(self.transport.as_ref()).await {
                Ok(snapshot) => Region::Ready(normalize(&snapshot, &config)),
                Err(e) => {
                    tracing::warn!("Resource refresh failed: {}", e);
                    Region::Unavailable(e.to_string())
                }
            }
        };

        self.model.write().await.resources = region;
    }

    /// Switch the uptime window and fetch metrics for it.
    pub async fn select_resolution(&self, resolution: Resolution) {
        self.context.write().await.resolution = resolution;
        tracing::info!("Uptime window set to {}", resolution.label());
        self.poll_metrics().await;
    }

    /// Apply new panel visibility and refresh the resource region.
    pub async fn apply_resources_config(&self, config: ResourcesConfig) {
        self.context.write().await.resources_config = config;
        self.poll_resources().await;
    }

    /// Probe one service now and show the result without waiting for the
    /// next cycle. A full refresh follows in the background.
    pub async fn force_check(
        &self,
        gate: &Gate,
        service_key: &str,
    ) -> Result<Classification, ForceCheckError> {
        let disabled = self
            .model
            .read()
            .await
            .live
            .ready()
            .and_then(|live| live.state_of(service_key))
            == Some(ServiceState::Disabled);
        if disabled {
            return Err(ForceCheckError::Disabled(service_key.to_string()));
        }

        let probe = gate.force_check(service_key).await?;
        let status = ServiceStatus::new(probe);
        let classification = status.classification.clone();

        {
            let mut model = self.model.write().await;
            match &mut model.live {
                Region::Ready(live) => {
                    live.services.insert(service_key.to_string(), status);
                }
                other => {
                    let mut services = BTreeMap::new();
                    services.insert(service_key.to_string(), status);
                    *other = Region::Ready(LiveView {
                        updated: self.clock.now().with_timezone(&Utc),
                        services,
                    });
                }
            }
        }

        tracing::info!(
            "Forced check of {}: {}",
            service_key,
            classification.state.as_str()
        );

        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.refresh_all().await });

        Ok(classification)
    }

    /// Turn monitoring of a service on or off, then refresh everything.
    ///
    /// The live entry is flipped right away so a force-check issued before
    /// the refresh lands already sees the new state.
    pub async fn toggle_monitoring(
        &self,
        gate: &Gate,
        service_key: &str,
        enable: bool,
    ) -> Result<ToggleResult, AdminError> {
        let result = gate.toggle_monitoring(service_key, enable).await?;

        {
            let mut model = self.model.write().await;
            if let Region::Ready(live) = &mut model.live {
                if let Some(entry) = live.services.get_mut(&result.service) {
                    let mut probe = entry.probe.clone();
                    probe.disabled = !result.enabled;
                    *entry = ServiceStatus::new(probe);
                }
            }
        }

        self.refresh_all().await;
        Ok(result)
    }

    /// Record a sample for every enabled service, then refresh everything.
    pub async fn ingest_now(&self, gate: &Gate) -> Result<IngestResult, AdminError> {
        let result = gate.ingest_now().await?;
        self.refresh_all().await;
        Ok(result)
    }

    /// Drop recent incidents, then refresh everything.
    pub async fn reset_recent(&self, gate: &Gate) -> Result<(), AdminError> {
        gate.reset_recent().await?;
        self.refresh_all().await;
        Ok(())
    }

    /// Save the panel config and show the resource region under it.
    pub async fn save_resources_config(
        &self,
        gate: &Gate,
        config: &ResourcesConfig,
    ) -> Result<ResourcesConfig, AdminError> {
        let saved = gate.save_resources_config(config).await?;
        self.apply_resources_config(saved.clone()).await;
        Ok(saved)
    }
}
