use thiserror::Error;

/// Errors that can occur within any delivery channel adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No adapter is registered under the requested name.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// No adapter has been registered at all.
    #[error("No delivery channels registered")]
    NoChannels,

    /// A delivery could not be handed off to the transport.
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
