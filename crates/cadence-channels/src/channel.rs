use async_trait::async_trait;

use cadence_core::delivery::OutboundDelivery;

use crate::error::ChannelError;

/// Common interface implemented by every delivery channel adapter.
///
/// Implementations must be `Send + Sync` so they can be stored in a
/// [`ChannelManager`](crate::manager::ChannelManager) and driven from the
/// delivery-router task.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"outbox"`).
    ///
    /// Used as the key inside the manager and matched against the `channel`
    /// field of test-message requests; must be unique across adapters.
    fn name(&self) -> &str;

    /// Hand one delivery off to the transport.
    ///
    /// This is intentionally `&self` (shared reference) so an adapter can
    /// send concurrently without a mutable borrow.
    async fn send(&self, delivery: &OutboundDelivery) -> Result<(), ChannelError>;
}
