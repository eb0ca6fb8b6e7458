use std::collections::HashMap;

use tracing::{debug, info};

use cadence_core::delivery::OutboundDelivery;

use crate::{channel::DeliveryChannel, error::ChannelError};

/// Registry of delivery channel adapters.
///
/// Channels are stored by their [`DeliveryChannel::name`]; the first one
/// registered becomes the default route for deliveries that don't name a
/// channel explicitly.
pub struct ChannelManager {
    channels: HashMap<String, Box<dyn DeliveryChannel>>,
    default: Option<String>,
}

impl ChannelManager {
    /// Create an empty manager with no registered channels.
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            default: None,
        }
    }

    /// Register a channel adapter.
    ///
    /// If a channel with the same name is already registered it is replaced.
    /// The first registration becomes the default route.
    pub fn register(&mut self, channel: Box<dyn DeliveryChannel>) {
        let name = channel.name().to_string();
        info!(channel = %name, "registering delivery channel");
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.channels.insert(name, channel);
    }

    /// Route one delivery to the named channel, or to the default when
    /// `channel` is `None`.
    pub async fn deliver(
        &self,
        channel: Option<&str>,
        delivery: &OutboundDelivery,
    ) -> Result<(), ChannelError> {
        let name = match channel {
            Some(name) => name,
            None => self.default.as_deref().ok_or(ChannelError::NoChannels)?,
        };
        let adapter = self
            .channels
            .get(name)
            .ok_or_else(|| ChannelError::UnknownChannel(name.to_string()))?;

        adapter.send(delivery).await?;
        debug!(channel = %name, user = %delivery.user_id, category = %delivery.category, "delivery handed off");
        Ok(())
    }

    /// Registered channel names, sorted for deterministic output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_core::delivery::DeliveryRequest;
    use cadence_core::types::{Category, JobKind, UserId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingChannel {
        name: String,
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DeliveryChannel for CountingChannel {
        fn name(&self) -> &str {
            &self.name
        }
        async fn send(&self, _delivery: &OutboundDelivery) -> Result<(), ChannelError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn delivery() -> OutboundDelivery {
        OutboundDelivery::from(&DeliveryRequest::scheduled(
            UserId::from("u1"),
            Category::from("health"),
            JobKind::DailyMessage,
        ))
    }

    #[tokio::test]
    async fn routes_to_named_channel() {
        let mut manager = ChannelManager::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        manager.register(Box::new(CountingChannel {
            name: "a".into(),
            sent: Arc::clone(&a),
        }));
        manager.register(Box::new(CountingChannel {
            name: "b".into(),
            sent: Arc::clone(&b),
        }));

        manager.deliver(Some("b"), &delivery()).await.unwrap();
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_registered_is_default() {
        let mut manager = ChannelManager::new();
        let a = Arc::new(AtomicUsize::new(0));
        manager.register(Box::new(CountingChannel {
            name: "a".into(),
            sent: Arc::clone(&a),
        }));

        manager.deliver(None, &delivery()).await.unwrap();
        assert_eq!(a.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_channel_is_an_error() {
        let mut manager = ChannelManager::new();
        manager.register(Box::new(CountingChannel {
            name: "a".into(),
            sent: Arc::new(AtomicUsize::new(0)),
        }));
        assert!(matches!(
            manager.deliver(Some("nope"), &delivery()).await,
            Err(ChannelError::UnknownChannel(_))
        ));
    }

    #[tokio::test]
    async fn empty_manager_reports_no_channels() {
        let manager = ChannelManager::new();
        assert!(matches!(
            manager.deliver(None, &delivery()).await,
            Err(ChannelError::NoChannels)
        ));
    }
}
