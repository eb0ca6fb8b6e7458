use thiserror::Error;

use cadence_core::types::UserId;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A configured time period is malformed (unparseable times, inverted
    /// window). Aborts that user's rebuild; previous jobs are retained.
    #[error("Invalid time period for {user}/{category}: {reason}")]
    InvalidPeriod {
        user: UserId,
        category: String,
        reason: String,
    },

    /// A recurrence rule cannot produce a next occurrence.
    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// The user does not exist in the schedule source.
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
