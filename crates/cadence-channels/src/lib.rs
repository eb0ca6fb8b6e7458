//! `cadence-channels` — the delivery seam between the scheduler and the
//! external processes that actually talk to users.
//!
//! The scheduler never composes or sends a message itself; it emits
//! [`OutboundDelivery`] records which a [`DeliveryChannel`] adapter hands
//! off. The bundled [`OutboxChannel`] writes one JSON file per delivery
//! into an outbox directory, mirroring the inbound file-based control plane.
//!
//! [`OutboundDelivery`]: cadence_core::delivery::OutboundDelivery

pub mod channel;
pub mod error;
pub mod manager;
pub mod outbox;

pub use channel::DeliveryChannel;
pub use error::{ChannelError, Result};
pub use manager::ChannelManager;
pub use outbox::OutboxChannel;
