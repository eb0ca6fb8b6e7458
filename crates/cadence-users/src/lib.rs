//! `cadence-users` — per-user profile records and the JSON-file store the
//! scheduler reads them through.
//!
//! One `<user_id>.json` file per user under the configured users directory.
//! The store is read-only from the scheduler's point of view: the admin
//! process owns the files, and `reload` picks up edits between ticks.

pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, UserStoreError};
pub use store::UserStore;
pub use types::UserProfile;
