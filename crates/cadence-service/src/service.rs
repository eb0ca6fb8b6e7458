use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use cadence_core::delivery::DeliveryRequest;
use cadence_requests::{RequestWatcher, SweepStats};
use cadence_scheduler::Scheduler;
use cadence_users::UserStore;

/// More jobs per user than this strongly suggests accumulation and trips
/// the health check.
const MAX_JOBS_PER_USER: usize = 64;

/// The fixed-interval polling cycle tying the subsystems together.
///
/// Single-threaded and cooperative: the scheduler, watcher, and store are
/// only ever touched from this loop, so none of them need locking. Each
/// tick step is isolated — a failure in one is logged and the tick carries
/// on with the rest.
pub struct ServiceLoop {
    scheduler: Scheduler,
    watcher: RequestWatcher,
    store: Arc<UserStore>,
    delivery_tx: mpsc::Sender<DeliveryRequest>,
    tick: Duration,
    requests_dir: PathBuf,
}

impl ServiceLoop {
    pub fn new(
        scheduler: Scheduler,
        watcher: RequestWatcher,
        store: Arc<UserStore>,
        delivery_tx: mpsc::Sender<DeliveryRequest>,
        tick: Duration,
        requests_dir: PathBuf,
    ) -> Self {
        Self {
            scheduler,
            watcher,
            store,
            delivery_tx,
            tick,
            requests_dir,
        }
    }

    /// Main event loop. Polls at the configured tick until `shutdown`
    /// broadcasts `true` — worst-case shutdown latency is one tick.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(tick_secs = self.tick.as_secs(), "service loop started");

        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_once();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("service loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One polling cycle: fire due jobs, sweep the request directory, then
    /// a lightweight self-health check.
    fn tick_once(&mut self) {
        // 1. Fire any due jobs.
        let fired = self.scheduler.fire_due(Utc::now());
        if fired > 0 {
            info!(fired, "due jobs fired");
        }

        // 2. Pick up config edits, then sweep the request directory.
        self.store.reload();
        let stats = self.watcher.sweep(&mut self.scheduler, &self.delivery_tx);
        if stats != SweepStats::default() {
            info!(
                processed = stats.processed,
                quarantined = stats.quarantined,
                reclaimed = stats.reclaimed,
                "request sweep"
            );
        }

        // 3. Self-health.
        self.health_check();
    }

    /// Cheap sanity probes: the request directory is still writable, and the
    /// job table hasn't grown past anything the configuration can explain.
    fn health_check(&self) {
        let probe = self.requests_dir.join(".cadence-health");
        match std::fs::write(&probe, b"ok") {
            Ok(()) => {
                let _ = std::fs::remove_file(&probe);
            }
            Err(e) => {
                error!(dir = %self.requests_dir.display(), error = %e, "requests directory not writable");
            }
        }

        let users = self.store.len().max(1);
        let jobs = self.scheduler.job_count();
        if jobs > users * MAX_JOBS_PER_USER {
            warn!(
                jobs,
                users, "job table larger than configuration can explain; possible accumulation"
            );
        } else {
            debug!(jobs, users, "health check ok");
        }
    }
}
