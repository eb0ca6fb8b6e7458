//! In-memory registry of scheduled jobs, keyed by `(user, category, period)`.
//!
//! The map structure *is* the de-duplication invariant: inserting a job for
//! an existing key replaces the old entry, so "at most one job per key"
//! holds by construction. Accessed only from the service loop thread.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use cadence_core::types::{Category, JobKind, UserId};

/// Identity of a scheduling slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub user_id: UserId,
    pub category: Category,
    pub period_id: String,
}

/// One scheduled trigger.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub key: JobKey,
    pub kind: JobKind,
    /// Next instant this job fires.
    pub fire_time: DateTime<Utc>,
    /// Start-of-window time the job re-anchors to after each fire.
    pub period_start: NaiveTime,
}

impl ScheduledJob {
    pub fn new(key: JobKey, kind: JobKind, fire_time: DateTime<Utc>, period_start: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            kind,
            fire_time,
            period_start,
        }
    }
}

/// The job registry. Plain `HashMap` under single-thread ownership.
#[derive(Default)]
pub struct JobTable {
    jobs: HashMap<JobKey, ScheduledJob>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job, replacing any existing entry under the same key.
    pub fn insert(&mut self, job: ScheduledJob) -> Option<ScheduledJob> {
        self.jobs.insert(job.key.clone(), job)
    }

    pub fn remove(&mut self, key: &JobKey) -> Option<ScheduledJob> {
        self.jobs.remove(key)
    }

    pub fn get(&self, key: &JobKey) -> Option<&ScheduledJob> {
        self.jobs.get(key)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// All keys currently registered for one user.
    pub fn user_keys(&self, user: &UserId) -> Vec<JobKey> {
        self.jobs
            .keys()
            .filter(|k| &k.user_id == user)
            .cloned()
            .collect()
    }

    /// All jobs currently registered for one user.
    pub fn user_jobs(&self, user: &UserId) -> Vec<&ScheduledJob> {
        self.jobs
            .values()
            .filter(|j| &j.key.user_id == user)
            .collect()
    }

    /// Drop every job for a user. Returns how many were removed.
    pub fn remove_user(&mut self, user: &UserId) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|k, _| &k.user_id != user);
        before - self.jobs.len()
    }

    /// Keys of jobs whose fire time has arrived, sorted by fire time so the
    /// oldest backlog drains first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<JobKey> {
        let mut due: Vec<(&JobKey, DateTime<Utc>)> = self
            .jobs
            .iter()
            .filter(|(_, j)| j.fire_time <= now)
            .map(|(k, j)| (k, j.fire_time))
            .collect();
        due.sort_by_key(|(_, t)| *t);
        due.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Reschedule one job. No-op when the key has been removed in between.
    pub fn set_fire_time(&mut self, key: &JobKey, when: DateTime<Utc>) {
        if let Some(job) = self.jobs.get_mut(key) {
            job.fire_time = when;
        }
    }
}
