//! Inbound bus messages.
//!
//! Each payload received on one of the adapter's channels goes through:
//!
//! ```text
//! Received → Decoded ──────────→ OriginCheck ──→ route(Origin::Remote)
//!               │                    │                 │
//!               └ DecodeError:       └ own node id:    └ namespace check,
//!                 drop + warn          drop              local delivery
//! ```

use std::sync::Weak;

use async_trait::async_trait;

use crate::domain::foundation::NodeId;
use crate::domain::relay::Envelope;
use crate::ports::MessageHandler;

use super::adapter::{Origin, RelayAdapter};

/// Bus handler feeding remote broadcasts into a [`RelayAdapter`].
///
/// Holds the adapter weakly: the adapter owns its subscriptions, and the
/// subscriptions own this handler.
pub struct InboundDispatcher {
    adapter: Weak<RelayAdapter>,
    node_id: NodeId,
}

impl InboundDispatcher {
    pub fn new(adapter: Weak<RelayAdapter>, node_id: NodeId) -> Self {
        Self { adapter, node_id }
    }

    /// Decode a payload and drop it if this node published it.
    fn accept(&self, channel: &str, payload: &[u8]) -> Option<Envelope> {
        let envelope = match Envelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(channel, error = %e, "Dropping undecodable bus message");
                return None;
            }
        };

        if envelope.origin == self.node_id {
            tracing::trace!(channel, "Ignoring own broadcast");
            return None;
        }

        Some(envelope)
    }
}

#[async_trait]
impl MessageHandler for InboundDispatcher {
    async fn handle(&self, channel: &str, payload: &[u8]) {
        let Some(envelope) = self.accept(channel, payload) else {
            return;
        };

        let Some(adapter) = self.adapter.upgrade() else {
            tracing::debug!(channel, "Adapter dropped, ignoring bus message");
            return;
        };

        if let Err(e) = adapter
            .route(envelope.packet, envelope.options, Origin::Remote)
            .await
        {
            tracing::warn!(channel, error = %e, "Remote broadcast failed");
        }
    }

    fn name(&self) -> &'static str {
        "InboundDispatcher"
    }
}
