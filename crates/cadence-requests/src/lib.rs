//! `cadence-requests` — the inbound half of the file-based control plane.
//!
//! A separate admin process drops `<kind>_<user>_<category>_<ts>_<rand>.json`
//! files into a well-known directory; the [`watcher::RequestWatcher`] claims
//! each one exactly once via an atomic rename, dispatches it (reschedule →
//! `ensure_schedule`, test message → a direct delivery), and removes it.
//! Malformed files are quarantined, never silently dropped, and a crash
//! between claim and removal is recovered by the stale-claim sweep —
//! at-least-once, backed by idempotent handlers.

pub mod error;
pub mod types;
pub mod watcher;

pub use error::{RequestError, Result};
pub use types::{RequestKind, RescheduleRequest, TestMessageRequest};
pub use watcher::{RequestWatcher, SweepStats};
