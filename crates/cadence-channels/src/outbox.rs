use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use cadence_core::delivery::OutboundDelivery;

use crate::{channel::DeliveryChannel, error::ChannelError};

/// File-based delivery hand-off.
///
/// Each delivery becomes one JSON file under the outbox directory; the
/// external delivery process (which owns message composition and the actual
/// user-facing transport) consumes and removes them. The filename carries
/// the same `<kind>_<user>_<category>_<timestamp>_<random>` shape as the
/// inbound request files so both sides of the control plane read alike.
pub struct OutboxChannel {
    dir: PathBuf,
}

impl OutboxChannel {
    /// Create the adapter, ensuring the outbox directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ChannelError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn filename(delivery: &OutboundDelivery) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "delivery_{}_{}_{}_{}.json",
            delivery.user_id,
            delivery.category,
            Utc::now().timestamp(),
            &random[..8]
        )
    }
}

#[async_trait]
impl DeliveryChannel for OutboxChannel {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn send(&self, delivery: &OutboundDelivery) -> Result<(), ChannelError> {
        let path = self.dir.join(Self::filename(delivery));
        let body = serde_json::to_vec_pretty(delivery)
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;

        // Write-then-rename so the consumer never sees a half-written file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), "delivery written to outbox");
        Ok(())
    }
}
