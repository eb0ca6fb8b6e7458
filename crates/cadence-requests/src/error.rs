use thiserror::Error;

/// Errors from the request control plane.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The file body is not valid JSON for its kind. Quarantined.
    #[error("Malformed request: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload parsed but fails validation. Quarantined.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// Transient filesystem failure. Retried next tick.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RequestError>;
