//! Read-only views the scheduler consumes its inputs through.
//!
//! User configuration and tasks are owned by external collaborators; the
//! scheduler only ever sees them through these traits, which keeps the
//! idempotent-rebuild logic unit-testable against in-memory fakes.

use crate::types::{Category, Task, TimePeriod, UserId};

/// Per-user schedule configuration: categories, feature flags, time periods.
///
/// Implementations must present a stable snapshot for the duration of one
/// scheduling pass — a rebuild reads the same data it diffs against.
pub trait ScheduleSource: Send + Sync {
    /// All users currently known to the configuration store.
    fn users(&self) -> Vec<UserId>;

    /// Whether the user exists at all (distinct from "no categories").
    fn contains(&self, user: &UserId) -> bool;

    /// Categories the user has any schedule configuration for, in a
    /// deterministic order.
    fn categories(&self, user: &UserId) -> Vec<Category>;

    /// Feature flag for one (user, category). Disabled categories are
    /// skipped during a rebuild even when periods are configured.
    fn enabled(&self, user: &UserId, category: &Category) -> bool;

    /// Configured time periods for one (user, category).
    fn periods(&self, user: &UserId, category: &Category) -> Vec<TimePeriod>;
}

/// Snapshot of a user's tasks from the external task subsystem.
pub trait TaskSource: Send + Sync {
    fn tasks(&self, user: &UserId) -> Vec<Task>;
}
