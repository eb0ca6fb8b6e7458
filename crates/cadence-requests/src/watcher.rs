use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use cadence_core::delivery::DeliveryRequest;
use cadence_core::types::{Category, JobKind, UserId};
use cadence_scheduler::Scheduler;

use crate::error::RequestError;
use crate::types::{parse_filename, RequestKind, RescheduleRequest, TestMessageRequest};

/// Suffix appended to a request file when it is claimed.
const CLAIMED_SUFFIX: &str = ".claimed";
/// Subdirectory malformed requests are moved to.
const INVALID_DIR: &str = "invalid";

/// What one sweep did, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Requests parsed, dispatched, and removed.
    pub processed: usize,
    /// Files moved to the invalid/ quarantine.
    pub quarantined: usize,
    /// Stuck claimed files picked up again this sweep.
    pub reclaimed: usize,
}

/// Polls the request directory and consumes each request file exactly once.
///
/// Claim-before-process: a discovered file is first renamed to
/// `<name>.claimed` — atomic on the same filesystem — so two sweeps can
/// never process the same file, and a crash between claim and removal
/// leaves a `.claimed` file the stale sweep picks up later. Handlers are
/// idempotent, so replay after a crash is safe (a test message may be sent
/// twice; that is the documented at-least-once trade-off).
pub struct RequestWatcher {
    dir: PathBuf,
    invalid_dir: PathBuf,
    claim_stale: Duration,
}

impl RequestWatcher {
    pub fn new(dir: impl Into<PathBuf>, claim_stale: Duration) -> Self {
        let dir = dir.into();
        let invalid_dir = dir.join(INVALID_DIR);
        Self {
            dir,
            invalid_dir,
            claim_stale,
        }
    }

    /// One polling pass: claim and dispatch fresh requests, then reclaim
    /// claims stuck past the stale threshold.
    ///
    /// A transient directory-read failure is logged and retried next tick;
    /// nothing here propagates past the tick boundary.
    pub fn sweep(
        &self,
        scheduler: &mut Scheduler,
        delivery_tx: &mpsc::Sender<DeliveryRequest>,
    ) -> SweepStats {
        let mut stats = SweepStats::default();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "requests directory unreadable; will retry next tick");
                return stats;
            }
        };

        let mut fresh: Vec<(PathBuf, RequestKind)> = Vec::new();
        let mut stale_claims: Vec<(PathBuf, RequestKind)> = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if let Some(kind) = parse_filename(name) {
                fresh.push((path, kind));
            } else if let Some(original) = name.strip_suffix(CLAIMED_SUFFIX) {
                let Some(kind) = parse_filename(original) else {
                    continue;
                };
                if self.is_stale(&path) {
                    stale_claims.push((path, kind));
                }
            }
        }

        for (path, kind) in fresh {
            // Claim first. Losing the rename race (or the admin pulling the
            // file back) is not an error — someone else owns it now.
            let claimed = claimed_path(&path);
            if let Err(e) = std::fs::rename(&path, &claimed) {
                debug!(path = %path.display(), error = %e, "claim failed; skipping");
                continue;
            }
            self.process_claimed(&claimed, kind, scheduler, delivery_tx, &mut stats);
        }

        for (path, kind) in stale_claims {
            warn!(path = %path.display(), "reclaiming request stuck in claimed state");
            stats.reclaimed += 1;
            self.process_claimed(&path, kind, scheduler, delivery_tx, &mut stats);
        }

        stats
    }

    fn is_stale(&self, path: &Path) -> bool {
        let age = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.elapsed().ok());
        match age {
            Some(age) => age >= self.claim_stale,
            // Unreadable metadata: treat as stale so the file can't wedge.
            None => true,
        }
    }

    /// Parse, dispatch, and remove one claimed file.
    fn process_claimed(
        &self,
        path: &Path,
        kind: RequestKind,
        scheduler: &mut Scheduler,
        delivery_tx: &mpsc::Sender<DeliveryRequest>,
        stats: &mut SweepStats,
    ) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                // Leave the claimed file in place; the stale sweep retries.
                warn!(path = %path.display(), error = %e, "claimed request unreadable");
                return;
            }
        };

        match self.dispatch(kind, &raw, scheduler, delivery_tx) {
            Ok(()) => {
                stats.processed += 1;
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "processed request could not be removed");
                }
            }
            Err(RequestError::Io(e)) => {
                warn!(path = %path.display(), error = %e, "request dispatch hit I/O error; will retry");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "quarantining malformed request");
                self.quarantine(path);
                stats.quarantined += 1;
            }
        }
    }

    fn dispatch(
        &self,
        kind: RequestKind,
        raw: &str,
        scheduler: &mut Scheduler,
        delivery_tx: &mpsc::Sender<DeliveryRequest>,
    ) -> Result<(), RequestError> {
        match kind {
            RequestKind::Reschedule => {
                let request: RescheduleRequest = serde_json::from_str(raw)?;
                request.validate()?;
                let user = UserId::from(request.user_id.as_str());
                info!(
                    user = %user,
                    category = %request.category,
                    reason = %request.reason,
                    "reschedule requested"
                );
                // A rebuild is a full idempotent diff; "all" and a specific
                // category take the same path.
                match scheduler.ensure_schedule(&user) {
                    Ok(outcome) => {
                        info!(user = %user, ?outcome, "reschedule applied");
                    }
                    Err(e) => {
                        // The request is consumed either way — an admin can
                        // always issue another once the config is fixed.
                        error!(user = %user, error = %e, "reschedule failed");
                    }
                }
                Ok(())
            }
            RequestKind::TestMessage => {
                let request: TestMessageRequest = serde_json::from_str(raw)?;
                request.validate()?;
                let category = Category::from(request.category.as_str());
                let mut delivery = DeliveryRequest::scheduled(
                    UserId::from(request.user_id.as_str()),
                    category.clone(),
                    JobKind::for_category(&category),
                );
                delivery.channel = Some(request.channel.clone());
                delivery.test = true;
                info!(
                    user = %request.user_id,
                    category = %request.category,
                    channel = %request.channel,
                    "test message requested"
                );
                if delivery_tx.try_send(delivery).is_err() {
                    warn!("delivery channel full or closed — test message dropped");
                }
                Ok(())
            }
        }
    }

    /// Move a malformed request into `invalid/`, keeping its name.
    fn quarantine(&self, path: &Path) {
        if let Err(e) = std::fs::create_dir_all(&self.invalid_dir) {
            warn!(error = %e, "could not create quarantine directory");
            return;
        }
        let name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "unnamed.claimed".into());
        let target = self.invalid_dir.join(name);
        if let Err(e) = std::fs::rename(path, &target) {
            warn!(path = %path.display(), error = %e, "could not quarantine request");
        }
    }
}

fn claimed_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(CLAIMED_SUFFIX);
    path.with_file_name(name)
}
