//! `cadence-scheduler` — the scheduling core: job table, idempotent rebuild,
//! recurrence math, weighted reminder selection, and wake-timer arming.
//!
//! # Overview
//!
//! The [`engine::Scheduler`] owns an in-memory [`table::JobTable`] of one
//! entry per `(user, category, period)`. Each service-loop tick it fires due
//! jobs by pushing [`DeliveryRequest`]s onto an mpsc channel — actual
//! delivery is someone else's job — and advances each fired job to the next
//! daily occurrence of its period.
//!
//! `ensure_schedule` rebuilds a user's jobs as a diff against the desired
//! set rather than appending, so calling it any number of times with
//! unchanged configuration leaves the table byte-for-byte identical. That
//! diff is the anti-accumulation guarantee the rest of the design leans on.
//!
//! [`DeliveryRequest`]: cadence_core::delivery::DeliveryRequest

pub mod engine;
pub mod error;
pub mod recurrence;
pub mod selector;
pub mod table;
pub mod wake;

pub use engine::{RebuildOutcome, Scheduler};
pub use error::{Result, SchedulerError};
pub use table::{JobKey, JobTable, ScheduledJob};
pub use wake::{NoopWake, RtcWake, WakeTimer};
