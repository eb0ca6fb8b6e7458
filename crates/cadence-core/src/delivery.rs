//! Delivery payload types — shared between the scheduler engine, the request
//! watcher, and the channel adapters.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{Category, JobKind, UserId};

/// What a fired job (or a test-message request) asks the delivery layer to do.
///
/// Sent over the fired-job mpsc channel from the scheduler to the delivery
/// router; the external composer turns it into user-visible text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub user_id: UserId,
    pub category: Category,
    pub kind: JobKind,
    /// Set for task reminders: the task chosen by the selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
    /// Explicit channel override. `None` routes to the default channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// True for admin test sends, which bypass the scheduler.
    #[serde(default)]
    pub test: bool,
}

impl DeliveryRequest {
    /// A scheduled (non-test) delivery on the default channel.
    pub fn scheduled(user_id: UserId, category: Category, kind: JobKind) -> Self {
        Self {
            user_id,
            category,
            kind,
            task_id: None,
            task_title: None,
            channel: None,
            test: false,
        }
    }
}

/// The record a channel adapter actually receives — a [`DeliveryRequest`]
/// stamped with a creation time, ready to serialize into the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundDelivery {
    pub user_id: String,
    pub category: String,
    pub kind: JobKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
    #[serde(default)]
    pub test: bool,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<&DeliveryRequest> for OutboundDelivery {
    fn from(req: &DeliveryRequest) -> Self {
        Self {
            user_id: req.user_id.to_string(),
            category: req.category.to_string(),
            kind: req.kind,
            task_id: req.task_id.clone(),
            task_title: req.task_title.clone(),
            test: req.test,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
