//! `cadence-core` — shared types, configuration, and errors for the cadence
//! scheduling engine.
//!
//! Everything the other crates agree on lives here: user/category/task
//! domain types, the source traits the scheduler reads its inputs through,
//! the delivery payloads handed to the channel layer, and the top-level
//! configuration loaded from `cadence.toml` + `CADENCE_*` env overrides.

pub mod config;
pub mod delivery;
pub mod error;
pub mod source;
pub mod types;

pub use config::CadenceConfig;
pub use delivery::{DeliveryRequest, OutboundDelivery};
pub use error::{CadenceError, Result};
pub use source::{ScheduleSource, TaskSource};
pub use types::{
    Category, JobKind, RecurrenceAnchor, RecurrencePattern, RecurrenceRule, Task, TaskPriority,
    TimePeriod, UserId,
};
