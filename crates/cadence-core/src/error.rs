use thiserror::Error;

/// Top-level service errors — loading configuration, wiring subsystems.
///
/// Per-subsystem failures stay in the subsystem crates' own error enums;
/// this type only covers what the service binary itself can hit.
#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CadenceError>;
