//! OS wake-timer integration behind a narrow adapter seam.
//!
//! The scheduler registers at most one pending wake per `(user, slot)`;
//! `arrange_wake` is set-or-replace, so callers never have to check for an
//! existing registration. Hosts without a usable facility run with
//! [`NoopWake`] and simply won't be woken from sleep for a reminder.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use cadence_core::types::UserId;

/// Adapter contract for arranging host wake-ups near a scheduled time.
pub trait WakeTimer: Send {
    /// Set or replace the wake registration for `(user, slot)`.
    fn arrange_wake(&mut self, user: &UserId, slot: &str, when: DateTime<Utc>);

    /// Drop the registration for `(user, slot)`, if any.
    fn cancel_wake(&mut self, user: &UserId, slot: &str);
}

/// Adapter for platforms without a wake facility.
#[derive(Default)]
pub struct NoopWake;

impl WakeTimer for NoopWake {
    fn arrange_wake(&mut self, _user: &UserId, _slot: &str, _when: DateTime<Utc>) {}
    fn cancel_wake(&mut self, _user: &UserId, _slot: &str) {}
}

/// Linux RTC wakealarm adapter.
///
/// The kernel exposes a single alarm per RTC device, so the adapter keeps
/// every pending registration and programs the device with the earliest one
/// after each change. Programming is best-effort: a missing device or a
/// permission error is logged and otherwise ignored.
pub struct RtcWake {
    device: PathBuf,
    pending: HashMap<(String, String), DateTime<Utc>>,
}

impl RtcWake {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            pending: HashMap::new(),
        }
    }

    fn program(&self) {
        let Some(earliest) = self.pending.values().min() else {
            // Nothing pending — clear any previously set alarm.
            if let Err(e) = std::fs::write(&self.device, "0") {
                debug!(device = %self.device.display(), error = %e, "could not clear wakealarm");
            }
            return;
        };

        // The wakealarm interface rejects writes while an alarm is armed, so
        // clear before setting the new value.
        let _ = std::fs::write(&self.device, "0");
        let secs = earliest.timestamp().to_string();
        match std::fs::write(&self.device, &secs) {
            Ok(()) => debug!(device = %self.device.display(), at = %earliest, "wakealarm programmed"),
            Err(e) => {
                warn!(device = %self.device.display(), error = %e, "could not program wakealarm")
            }
        }
    }
}

impl WakeTimer for RtcWake {
    fn arrange_wake(&mut self, user: &UserId, slot: &str, when: DateTime<Utc>) {
        self.pending
            .insert((user.to_string(), slot.to_string()), when);
        self.program();
    }

    fn cancel_wake(&mut self, user: &UserId, slot: &str) {
        if self
            .pending
            .remove(&(user.to_string(), slot.to_string()))
            .is_some()
        {
            self.program();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, h, 0, 0).unwrap()
    }

    #[test]
    fn rtc_programs_earliest_pending_wake() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut wake = RtcWake::new(file.path());

        wake.arrange_wake(&UserId::from("u1"), "health", at(12));
        wake.arrange_wake(&UserId::from("u1"), "motivation", at(8));

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, at(8).timestamp().to_string());
    }

    #[test]
    fn rtc_replaces_existing_slot() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut wake = RtcWake::new(file.path());

        wake.arrange_wake(&UserId::from("u1"), "health", at(8));
        wake.arrange_wake(&UserId::from("u1"), "health", at(14));

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, at(14).timestamp().to_string());
    }

    #[test]
    fn rtc_cancel_clears_when_no_pending_left() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut wake = RtcWake::new(file.path());

        wake.arrange_wake(&UserId::from("u1"), "health", at(8));
        wake.cancel_wake(&UserId::from("u1"), "health");

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, "0");
    }

    #[test]
    fn rtc_missing_device_does_not_panic() {
        let mut wake = RtcWake::new("/nonexistent/rtc/wakealarm");
        wake.arrange_wake(&UserId::from("u1"), "health", at(8));
        wake.cancel_wake(&UserId::from("u1"), "health");
    }
}
