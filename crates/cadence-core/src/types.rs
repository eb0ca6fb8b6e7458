use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
///
/// User ids are assigned by the admin process that writes the profile files;
/// the scheduler treats them as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A class of recurring communication ("motivation", "health", "checkin",
/// "tasks", …). Categories are open-ended; the well-known names only matter
/// for deriving a [`JobKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category(pub String);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a scheduled job does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Periodic composed message (motivational, health prompt, …).
    DailyMessage,
    /// "How are you doing" style check-in.
    Checkin,
    /// Reminder about one selected task.
    TaskReminder,
}

impl JobKind {
    /// Derive the kind from a category name.
    ///
    /// `"checkin"` and `"tasks"` map to their dedicated kinds; every other
    /// category is a composed daily message.
    pub fn for_category(category: &Category) -> Self {
        match category.as_str() {
            "checkin" => JobKind::Checkin,
            "tasks" => JobKind::TaskReminder,
            _ => JobKind::DailyMessage,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::DailyMessage => "daily_message",
            JobKind::Checkin => "checkin",
            JobKind::TaskReminder => "task_reminder",
        };
        write!(f, "{s}")
    }
}

/// A daily window during which one communication of a category is scheduled.
///
/// Owned by user configuration and immutable during a scheduling pass.
/// Times are `"HH:MM"` strings in the profile files; the scheduler parses
/// them when computing a desired job set and rejects malformed values there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    /// Window start, `"HH:MM"` (24h).
    pub start: String,
    /// Window end, `"HH:MM"` (24h).
    pub end: String,
    /// Inactive periods are skipped entirely during a rebuild.
    #[serde(default = "bool_true")]
    pub active: bool,
}

impl TimePeriod {
    /// Stable identifier for this period within its (user, category) scope.
    ///
    /// Derived from the window itself so repeated rebuilds agree on the id
    /// without any stored state. Two periods sharing a start but differing
    /// in extent keep distinct ids.
    pub fn period_id(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

fn bool_true() -> bool {
    true
}

/// Task priority as assigned by the external task subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Snapshot of a task as read from the external task subsystem.
///
/// `due_date` stays a raw string because the task store's date format is not
/// ours to own; the reminder selector parses it and treats unparseable
/// values as "no due date".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub archived: bool,
}

/// How a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    /// Every `interval` days.
    Custom,
}

/// Which date the next occurrence is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceAnchor {
    /// Advance from the original due date, keeping the cadence fixed.
    #[default]
    OnSchedule,
    /// Advance from the completion date, so repeated skips don't pile up.
    AfterCompletion,
}

/// Recurrence definition attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    pub interval: i64,
    #[serde(default)]
    pub anchor: RecurrenceAnchor,
}
