//! Statusboard - headless dashboard client.
//!
//! Keeps the dashboard model fresh and logs a summary after every cycle.

use statusboard::client::RequestClient;
use statusboard::clock::SystemClock;
use statusboard::config::ClientConfig;
use statusboard::model::{DashboardContext, DashboardModel, Region};
use statusboard::scheduler::RefreshScheduler;
use statusboard::session::Gate;
use statusboard::status::ServiceState;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("statusboard=info".parse()?))
        .init();

    // Load configuration
    let cfg = ClientConfig::load();
    tracing::info!("Starting Statusboard against {}...", cfg.base_url);

    let transport = Arc::new(RequestClient::new(&cfg.base_url, cfg.request_timeout)?);
    let gate = Arc::new(Gate::new(transport.clone()));

    let mut context = DashboardContext::new(cfg.resolution);

    // A fresh cookie jar holds no session, so only configured credentials
    // can make this client an admin.
    if let Some((user, password)) = cfg.admin_credentials() {
        if let Err(e) = gate.login(user, password).await {
            tracing::error!("Admin login failed: {}", e);
        }
    }

    if gate.is_authenticated().await {
        match gate.resources_config().await {
            Ok(resources) => context.resources_config = resources,
            Err(e) => tracing::warn!("Could not load resource panel config: {}", e),
        }
        match gate.alerts_config().await {
            Ok(alerts) => tracing::info!(
                "Email alerts {}",
                if alerts.enabled { "enabled" } else { "disabled" }
            ),
            Err(e) => tracing::warn!("Could not load alerts config: {}", e),
        }
    }

    let scheduler = RefreshScheduler::new(
        transport,
        Arc::new(SystemClock),
        context,
        cfg.refresh_interval,
    );
    let handle = scheduler.start().await;

    let mut ticker = tokio::time::interval(cfg.refresh_interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            _ = ticker.tick() => {
                log_summary(&scheduler.model().await);
            }
        }
    }

    tracing::info!("Shutting down...");
    scheduler.stop().await;
    handle.await?;

    if gate.is_authenticated().await {
        gate.logout().await;
    }

    Ok(())
}

fn log_summary(model: &DashboardModel) {
    match &model.live {
        Region::Ready(live) => {
            let count = |state: ServiceState| {
                live.services
                    .values()
                    .filter(|s| s.classification.state == state)
                    .count()
            };
            tracing::info!(
                "{} up, {} degraded, {} down, {} disabled",
                count(ServiceState::Up),
                count(ServiceState::Degraded),
                count(ServiceState::Down),
                count(ServiceState::Disabled)
            );
        }
        Region::Unavailable(reason) => tracing::warn!("Live status unavailable: {}", reason),
        Region::Pending => {}
    }

    if let Region::Ready(metrics) = &model.metrics {
        for (key, overall) in &metrics.overall {
            tracing::info!("{} uptime ({}): {}", key, metrics.resolution.label(), overall);
        }
    }
}
