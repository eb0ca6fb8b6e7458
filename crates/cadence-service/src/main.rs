use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

mod service;

use cadence_channels::{ChannelManager, OutboxChannel};
use cadence_core::delivery::OutboundDelivery;
use cadence_core::source::{ScheduleSource, TaskSource};
use cadence_core::CadenceConfig;
use cadence_requests::RequestWatcher;
use cadence_scheduler::{NoopWake, RtcWake, Scheduler, WakeTimer};
use cadence_users::UserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info".into()),
        )
        .init();

    // load config: explicit path > CADENCE_CONFIG env > ~/.cadence/cadence.toml
    let config_path = std::env::var("CADENCE_CONFIG").ok();
    let config = CadenceConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        CadenceConfig::default()
    });

    // The service owns its directories; the admin and delivery processes
    // only ever see them already created.
    for dir in [
        &config.service.requests_dir,
        &config.service.outbox_dir,
        &config.service.users_dir,
    ] {
        std::fs::create_dir_all(dir)?;
    }

    info!(users_dir = %config.service.users_dir, "loading user profiles");
    let store = Arc::new(UserStore::load(config.service.users_dir.as_str())?);
    info!(users = store.len(), "profiles loaded");

    // Fired-job channel: Scheduler / RequestWatcher → delivery router task.
    let (delivery_tx, mut delivery_rx) = tokio::sync::mpsc::channel(256);

    let mut channels = ChannelManager::new();
    channels.register(Box::new(OutboxChannel::new(config.service.outbox_dir.as_str())?));

    let wake: Box<dyn WakeTimer> = if config.wake.enabled {
        Box::new(RtcWake::new(config.wake.rtc_device.as_str()))
    } else {
        info!("wake timers disabled; sleeping hosts will not be woken");
        Box::new(NoopWake)
    };

    let mut scheduler = Scheduler::new(
        Arc::clone(&store) as Arc<dyn ScheduleSource>,
        Arc::clone(&store) as Arc<dyn TaskSource>,
        wake,
        Some(delivery_tx.clone()),
    );

    // Initial rebuild for every known user.
    let rebuilt = scheduler.ensure_all();
    info!(rebuilt, jobs = scheduler.job_count(), "initial schedules built");

    // Delivery router: drains fired jobs into the channel registry. Delivery
    // failures are logged; the underlying job keeps its next scheduled fire.
    tokio::spawn(async move {
        while let Some(request) = delivery_rx.recv().await {
            let delivery = OutboundDelivery::from(&request);
            if let Err(e) = channels.deliver(request.channel.as_deref(), &delivery).await {
                error!(
                    user = %request.user_id,
                    category = %request.category,
                    error = %e,
                    "delivery failed"
                );
            }
        }
    });

    let watcher = RequestWatcher::new(
        config.service.requests_dir.as_str(),
        Duration::from_secs(config.service.claim_stale_secs),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let service = service::ServiceLoop::new(
        scheduler,
        watcher,
        store,
        delivery_tx,
        Duration::from_secs(config.service.tick_secs.max(1)),
        config.service.requests_dir.clone().into(),
    );
    service.run(shutdown_rx).await;

    Ok(())
}
