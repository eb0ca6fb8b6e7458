use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RequestError, Result};

/// The two request kinds the admin process can drop into the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Reschedule,
    TestMessage,
}

impl RequestKind {
    /// The filename prefix for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Reschedule => "reschedule",
            RequestKind::TestMessage => "testmessage",
        }
    }
}

/// Ask the scheduler to rebuild a user's jobs.
///
/// `category` is advisory — a rebuild is a full idempotent diff either way,
/// so `"all"` and a specific category behave identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub user_id: String,
    #[serde(default = "all_categories")]
    pub category: String,
    #[serde(default)]
    pub reason: String,
}

fn all_categories() -> String {
    "all".to_string()
}

/// Ask for one immediate delivery on a named channel, bypassing the
/// scheduler entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMessageRequest {
    pub user_id: String,
    pub category: String,
    pub channel: String,
}

impl RescheduleRequest {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(RequestError::Invalid("empty user_id".into()));
        }
        Ok(())
    }
}

impl TestMessageRequest {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(RequestError::Invalid("empty user_id".into()));
        }
        if self.channel.trim().is_empty() {
            return Err(RequestError::Invalid("empty channel".into()));
        }
        Ok(())
    }
}

/// Classify a directory entry by the filename convention
/// `<kind>_<user>_<category>_<timestamp>_<random>.json`.
///
/// Only the `<kind>` prefix and the `.json` suffix are load-bearing — the
/// authoritative user/category live in the payload. Returns `None` for
/// files the watcher should ignore (claimed files, foreign files).
pub fn parse_filename(name: &str) -> Option<RequestKind> {
    let stem = name.strip_suffix(".json")?;
    if stem.is_empty() {
        return None;
    }
    match stem.split('_').next()? {
        "reschedule" => Some(RequestKind::Reschedule),
        "testmessage" => Some(RequestKind::TestMessage),
        _ => None,
    }
}

/// Build a conventional filename for a new request file.
///
/// Used by tests here and by the admin tooling on the other side of the
/// directory.
pub fn request_filename(kind: RequestKind, user_id: &str, category: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}_{}.json",
        kind.as_str(),
        user_id,
        category,
        Utc::now().timestamp(),
        &random[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_prefix() {
        assert_eq!(
            parse_filename("reschedule_u1_all_1754560000_a1b2c3d4.json"),
            Some(RequestKind::Reschedule)
        );
        assert_eq!(
            parse_filename("testmessage_u1_health_1754560000_a1b2c3d4.json"),
            Some(RequestKind::TestMessage)
        );
    }

    #[test]
    fn ignores_foreign_and_claimed_files() {
        assert_eq!(parse_filename("notes.txt"), None);
        assert_eq!(parse_filename("delivery_u1_health_1_x.json"), None);
        assert_eq!(parse_filename(".json"), None);
        // Claimed files carry a different suffix and never match.
        assert_eq!(
            parse_filename("reschedule_u1_all_1754560000_a1b2c3d4.json.claimed"),
            None
        );
    }

    #[test]
    fn generated_names_round_trip() {
        let name = request_filename(RequestKind::Reschedule, "u1", "all");
        assert_eq!(parse_filename(&name), Some(RequestKind::Reschedule));
        let name = request_filename(RequestKind::TestMessage, "u2", "health");
        assert_eq!(parse_filename(&name), Some(RequestKind::TestMessage));
    }

    #[test]
    fn reschedule_defaults_category_to_all() {
        let req: RescheduleRequest = serde_json::from_str(r#"{"user_id":"u1"}"#).unwrap();
        assert_eq!(req.category, "all");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_fields() {
        let req: RescheduleRequest = serde_json::from_str(r#"{"user_id":"  "}"#).unwrap();
        assert!(req.validate().is_err());

        let req: TestMessageRequest =
            serde_json::from_str(r#"{"user_id":"u1","category":"health","channel":""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
