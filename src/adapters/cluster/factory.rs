//! Builds one relay adapter per namespace over a shared transport.

use std::sync::Arc;

use crate::adapters::bus::RedisBus;
use crate::config::AppConfig;
use crate::domain::foundation::{Namespace, NodeId};
use crate::domain::relay::ChannelNamer;
use crate::ports::{BusTransport, PacketDelivery};

use super::adapter::RelayAdapter;
use super::error::RelayError;

/// Shared settings for every adapter of one node.
///
/// All adapters built by the same factory share one node id, so a node
/// recognizes its own envelopes in every namespace.
#[derive(Clone)]
pub struct RelayAdapterFactory {
    node_id: NodeId,
    transport: Arc<dyn BusTransport>,
    namer: ChannelNamer,
}

impl RelayAdapterFactory {
    /// Create a factory with a fresh random node id.
    pub fn new(transport: Arc<dyn BusTransport>, namer: ChannelNamer) -> Self {
        Self::with_node_id(NodeId::random(), transport, namer)
    }

    pub fn with_node_id(
        node_id: NodeId,
        transport: Arc<dyn BusTransport>,
        namer: ChannelNamer,
    ) -> Self {
        Self {
            node_id,
            transport,
            namer,
        }
    }

    /// Connect to the configured Redis bus and build a factory over it.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Connect` if Redis is unreachable, and
    /// `RelayError::Config` if the adapter settings are invalid.
    pub async fn connect(config: &AppConfig) -> Result<Self, RelayError> {
        let namer = config
            .adapter
            .channel_namer()
            .map_err(|e| RelayError::Config(e.to_string()))?;
        let bus = RedisBus::connect(&config.bus)
            .await
            .map_err(RelayError::Connect)?;

        Ok(Self::new(Arc::new(bus), namer))
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn namer(&self) -> &ChannelNamer {
        &self.namer
    }

    /// Build the adapter for `namespace`, delivering through `delivery`.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Subscribe` if the namespace channel cannot be
    /// subscribed.
    pub async fn adapter(
        &self,
        namespace: Namespace,
        delivery: Arc<dyn PacketDelivery>,
    ) -> Result<Arc<RelayAdapter>, RelayError> {
        RelayAdapter::new(
            namespace,
            self.node_id.clone(),
            self.namer.clone(),
            self.transport.clone(),
            delivery,
        )
        .await
    }
}

impl std::fmt::Debug for RelayAdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayAdapterFactory")
            .field("node_id", &self.node_id)
            .field("namer", &self.namer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bus::InMemoryBus;
    use crate::adapters::sessions::RecordingDelivery;

    #[tokio::test]
    async fn adapters_share_node_id() {
        let factory = RelayAdapterFactory::new(
            Arc::new(InMemoryBus::new()),
            ChannelNamer::default(),
        );
        let delivery = Arc::new(RecordingDelivery::new());

        let root = factory
            .adapter(Namespace::root(), delivery.clone())
            .await
            .unwrap();
        let chat = factory
            .adapter(Namespace::from("/chat"), delivery)
            .await
            .unwrap();

        assert_eq!(root.node_id(), factory.node_id());
        assert_eq!(chat.node_id(), factory.node_id());
    }

    #[tokio::test]
    async fn factories_get_distinct_node_ids() {
        let bus: Arc<dyn BusTransport> = Arc::new(InMemoryBus::new());

        let a = RelayAdapterFactory::new(bus.clone(), ChannelNamer::default());
        let b = RelayAdapterFactory::new(bus, ChannelNamer::default());

        assert_ne!(a.node_id(), b.node_id());
    }

    #[tokio::test]
    async fn adapter_uses_factory_namer() {
        let bus = Arc::new(InMemoryBus::new());
        let factory = RelayAdapterFactory::with_node_id(
            NodeId::new("node-a"),
            bus.clone(),
            ChannelNamer::new("relay", '#'),
        );

        factory
            .adapter(Namespace::from("/chat"), Arc::new(RecordingDelivery::new()))
            .await
            .unwrap();

        assert_eq!(bus.channels().await, vec!["relay#/chat".to_string()]);
    }
}
