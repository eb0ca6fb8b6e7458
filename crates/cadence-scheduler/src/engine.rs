use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use cadence_core::delivery::DeliveryRequest;
use cadence_core::source::{ScheduleSource, TaskSource};
use cadence_core::types::{Category, JobKind, Task, TimePeriod, UserId};

use crate::error::{Result, SchedulerError};
use crate::selector;
use crate::table::{JobKey, JobTable, ScheduledJob};
use crate::wake::WakeTimer;

/// What one `ensure_schedule` call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

/// A desired scheduling slot, computed from configuration during a rebuild.
struct JobSpec {
    kind: JobKind,
    fire_time: DateTime<Utc>,
    period_start: NaiveTime,
}

/// The scheduling core.
///
/// Constructed once at startup and passed by handle rather than held as an
/// ambient global, so the idempotent-rebuild property stays unit-testable.
/// Owns the [`JobTable`] exclusively; everything else is read through the
/// source traits or pushed out through the fired-job channel.
///
/// Pass `Some(tx)` to receive a [`DeliveryRequest`] for every fired job.
/// The sender is non-blocking (`try_send`) so firing never stalls a tick.
pub struct Scheduler {
    table: JobTable,
    schedules: Arc<dyn ScheduleSource>,
    tasks: Arc<dyn TaskSource>,
    wake: Box<dyn WakeTimer>,
    fired_tx: Option<mpsc::Sender<DeliveryRequest>>,
}

impl Scheduler {
    pub fn new(
        schedules: Arc<dyn ScheduleSource>,
        tasks: Arc<dyn TaskSource>,
        wake: Box<dyn WakeTimer>,
        fired_tx: Option<mpsc::Sender<DeliveryRequest>>,
    ) -> Self {
        Self {
            table: JobTable::new(),
            schedules,
            tasks,
            wake,
            fired_tx,
        }
    }

    /// Idempotently reconcile one user's jobs with their configuration.
    ///
    /// Computes the desired job set from active time periods and enabled
    /// categories, then diffs it against the table by key: stale jobs are
    /// cancelled, missing ones added, unchanged ones left untouched (their
    /// ids and fire times survive). Calling this N times with unchanged
    /// inputs yields the same table as calling it once.
    ///
    /// If the desired set cannot be computed (a malformed period, say), the
    /// rebuild aborts with the previous jobs intact.
    pub fn ensure_schedule(&mut self, user: &UserId) -> Result<RebuildOutcome> {
        if !self.schedules.contains(user) {
            return Err(SchedulerError::UnknownUser(user.clone()));
        }

        let now = Utc::now();
        let desired = self.desired_jobs(user, now)?;

        let current: HashSet<JobKey> = self.table.user_keys(user).into_iter().collect();
        let desired_keys: HashSet<JobKey> = desired.keys().cloned().collect();
        let before_categories: HashSet<Category> =
            current.iter().map(|k| k.category.clone()).collect();

        let mut outcome = RebuildOutcome {
            added: 0,
            removed: 0,
            kept: 0,
        };

        for key in current.difference(&desired_keys) {
            self.table.remove(key);
            outcome.removed += 1;
        }
        for (key, spec) in desired {
            if current.contains(&key) {
                outcome.kept += 1;
            } else {
                self.table.insert(ScheduledJob::new(
                    key,
                    spec.kind,
                    spec.fire_time,
                    spec.period_start,
                ));
                outcome.added += 1;
            }
        }

        // Re-arm one wake slot per surviving category; drop slots whose
        // category lost its last job. Duplicate arrangements coalesce in the
        // adapter (set-or-replace), not here.
        let after_categories = self.arm_user_wakes(user);
        for category in before_categories.difference(&after_categories) {
            self.wake.cancel_wake(user, category.as_str());
        }

        info!(
            user = %user,
            added = outcome.added,
            removed = outcome.removed,
            kept = outcome.kept,
            "schedule rebuilt"
        );
        Ok(outcome)
    }

    /// Rebuild every known user. One user's configuration error never blocks
    /// the rest. Returns how many users rebuilt cleanly.
    pub fn ensure_all(&mut self) -> usize {
        let mut ok = 0;
        for user in self.schedules.users() {
            match self.ensure_schedule(&user) {
                Ok(_) => ok += 1,
                Err(e) => {
                    error!(user = %user, error = %e, "rebuild failed; previous jobs retained")
                }
            }
        }
        ok
    }

    /// Remove every job and wake registration for a user.
    pub fn cancel_all(&mut self, user: &UserId) {
        let categories: HashSet<Category> = self
            .table
            .user_jobs(user)
            .iter()
            .map(|j| j.key.category.clone())
            .collect();
        let removed = self.table.remove_user(user);
        for category in &categories {
            self.wake.cancel_wake(user, category.as_str());
        }
        info!(user = %user, removed, "all jobs cancelled");
    }

    /// Fire every due job, pushing a [`DeliveryRequest`] per delivery and
    /// advancing each fired job to the next daily occurrence of its period.
    ///
    /// Task-reminder jobs run the selector first; when nothing is eligible
    /// the job advances without a delivery. When several task-reminder
    /// periods collide on the same tick, only the first one delivers; the
    /// rest are coalesced so the user gets at most one reminder per tick.
    ///
    /// Returns the number of deliveries requested.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> usize {
        let due = self.table.due(now);
        if due.is_empty() {
            return 0;
        }

        let today = now.date_naive();
        let mut fired = 0;
        let mut reminded: HashSet<UserId> = HashSet::new();

        for key in due {
            let Some(job) = self.table.get(&key).cloned() else {
                continue;
            };

            match job.kind {
                JobKind::TaskReminder => {
                    if !reminded.insert(key.user_id.clone()) {
                        debug!(
                            user = %key.user_id,
                            period = %key.period_id,
                            "task reminder coalesced; another period already fired this tick"
                        );
                    } else if let Some(task) = self.select_reminder(&key.user_id, today) {
                        let mut request = DeliveryRequest::scheduled(
                            key.user_id.clone(),
                            key.category.clone(),
                            job.kind,
                        );
                        request.task_id = Some(task.id.clone());
                        request.task_title = Some(task.title.clone());
                        self.send(request);
                        fired += 1;
                    } else {
                        info!(user = %key.user_id, "no eligible task for reminder");
                    }
                }
                kind => {
                    self.send(DeliveryRequest::scheduled(
                        key.user_id.clone(),
                        key.category.clone(),
                        kind,
                    ));
                    fired += 1;
                }
            }

            // Re-anchor on the period start rather than adding a fixed day:
            // after a multi-day sleep the missed fires collapse into the one
            // that just happened instead of replaying per day.
            let next = next_fire_time(now, job.period_start);
            self.table.set_fire_time(&key, next);
            self.rearm_category(&key.user_id, &key.category);
        }
        fired
    }

    /// Choose the task the user would be reminded about right now.
    pub fn select_reminder_task(&self, user: &UserId) -> Option<String> {
        self.select_reminder(user, Utc::now().date_naive())
            .map(|t| t.id)
    }

    pub fn job_count(&self) -> usize {
        self.table.len()
    }

    pub fn user_job_count(&self, user: &UserId) -> usize {
        self.table.user_jobs(user).len()
    }

    // --- private helpers ---------------------------------------------------

    /// Desired job set for one user, keyed for de-duplication. Identical
    /// periods collapse to one entry; distinct periods that happen to share
    /// a fire time keep their own keys.
    fn desired_jobs(&self, user: &UserId, now: DateTime<Utc>) -> Result<HashMap<JobKey, JobSpec>> {
        let mut specs: HashMap<JobKey, JobSpec> = HashMap::new();

        for category in self.schedules.categories(user) {
            if !self.schedules.enabled(user, &category) {
                debug!(user = %user, category = %category, "category disabled; skipping");
                continue;
            }
            let kind = JobKind::for_category(&category);

            for period in self.schedules.periods(user, &category) {
                if !period.active {
                    continue;
                }
                let (start, _end) = parse_period(user, &category, &period)?;
                let key = JobKey {
                    user_id: user.clone(),
                    category: category.clone(),
                    period_id: period.period_id(),
                };
                specs.insert(
                    key,
                    JobSpec {
                        kind,
                        fire_time: next_fire_time(now, start),
                        period_start: start,
                    },
                );
            }
        }
        Ok(specs)
    }

    /// Arm one wake per category at that category's earliest fire time.
    /// Returns the categories that currently have jobs.
    fn arm_user_wakes(&mut self, user: &UserId) -> HashSet<Category> {
        let mut earliest: HashMap<Category, DateTime<Utc>> = HashMap::new();
        for job in self.table.user_jobs(user) {
            earliest
                .entry(job.key.category.clone())
                .and_modify(|t| *t = (*t).min(job.fire_time))
                .or_insert(job.fire_time);
        }
        for (category, when) in &earliest {
            self.wake.arrange_wake(user, category.as_str(), *when);
        }
        earliest.into_keys().collect()
    }

    fn rearm_category(&mut self, user: &UserId, category: &Category) {
        let earliest = self
            .table
            .user_jobs(user)
            .iter()
            .filter(|j| &j.key.category == category)
            .map(|j| j.fire_time)
            .min();
        match earliest {
            Some(when) => self.wake.arrange_wake(user, category.as_str(), when),
            None => self.wake.cancel_wake(user, category.as_str()),
        }
    }

    fn select_reminder(&self, user: &UserId, today: NaiveDate) -> Option<Task> {
        let tasks = self.tasks.tasks(user);
        selector::select(&tasks, today, &mut rand::thread_rng()).cloned()
    }

    fn send(&self, request: DeliveryRequest) {
        if let Some(tx) = &self.fired_tx {
            // try_send never blocks the tick loop; log a warning if the
            // channel is full.
            if tx.try_send(request).is_err() {
                warn!("delivery channel full or closed — delivery dropped");
            }
        }
    }
}

/// Next occurrence of `start` strictly after `now` (today or tomorrow, UTC).
fn next_fire_time(now: DateTime<Utc>, start: NaiveTime) -> DateTime<Utc> {
    let candidate = now.date_naive().and_time(start).and_utc();
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

fn parse_period(
    user: &UserId,
    category: &Category,
    period: &TimePeriod,
) -> Result<(NaiveTime, NaiveTime)> {
    let parse = |raw: &str| -> Result<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| SchedulerError::InvalidPeriod {
            user: user.clone(),
            category: category.to_string(),
            reason: format!("unparseable time {raw:?}"),
        })
    };
    let start = parse(&period.start)?;
    let end = parse(&period.end)?;
    if start >= end {
        return Err(SchedulerError::InvalidPeriod {
            user: user.clone(),
            category: category.to_string(),
            reason: format!("window {}-{} is inverted or empty", period.start, period.end),
        });
    }
    Ok((start, end))
}
