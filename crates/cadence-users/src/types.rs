use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cadence_core::types::{Task, TimePeriod};

/// One user's configuration as stored in `<users_dir>/<user_id>.json`.
///
/// The admin application owns the file format; the scheduler only reads the
/// fields below and ignores anything else (`deny_unknown_fields` is
/// deliberately absent so the admin side can evolve the file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Per-category feature flags. A category with configured schedules but
    /// no flag entry is treated as enabled; an explicit `false` disables it.
    #[serde(default)]
    pub features: HashMap<String, bool>,
    /// Category name → daily time periods.
    #[serde(default)]
    pub schedules: HashMap<String, Vec<TimePeriod>>,
    /// Snapshot of the user's tasks, maintained by the task subsystem.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl UserProfile {
    pub fn enabled(&self, category: &str) -> bool {
        self.features.get(category).copied().unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_profile_parses() {
        let profile: UserProfile = serde_json::from_str(r#"{"user_id":"u1"}"#).unwrap();
        assert_eq!(profile.user_id, "u1");
        assert!(profile.schedules.is_empty());
        assert!(profile.tasks.is_empty());
    }

    #[test]
    fn missing_feature_flag_means_enabled() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"user_id":"u1","features":{"health":false},
                "schedules":{"health":[],"motivation":[]}}"#,
        )
        .unwrap();
        assert!(!profile.enabled("health"));
        assert!(profile.enabled("motivation"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"user_id":"u1","theme":"dark","avatar":"x.png"}"#).unwrap();
        assert_eq!(profile.user_id, "u1");
    }
}
