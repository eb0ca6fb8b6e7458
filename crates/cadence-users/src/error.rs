use thiserror::Error;

/// Errors from the user profile store.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// The users directory itself could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A profile file did not parse. Only surfaced for explicit single-file
    /// loads; directory scans skip bad files with a warning instead.
    #[error("Malformed profile {path}: {reason}")]
    Parse { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, UserStoreError>;
