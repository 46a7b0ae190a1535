//! In-memory bus implementation for testing.
//!
//! Provides synchronous, deterministic delivery: `publish` returns only after
//! every handler subscribed to the channel has run, the publisher's own
//! handlers included. Several adapters sharing one `InMemoryBus` behave like
//! several nodes sharing one broker.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{BusTransport, MessageHandler, SubscriptionHandle, TransportError};

/// A payload captured by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

/// In-memory publish/subscribe bus.
///
/// Features:
/// - Synchronous delivery (deterministic for tests)
/// - Publication capture for assertions
/// - Failure injection for subscribe, unsubscribe and publish
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryBus::new());
/// let node1 = factory_on(bus.clone()).adapter(ns.clone(), hub1).await?;
/// let node2 = factory_on(bus.clone()).adapter(ns, hub2).await?;
///
/// node1.broadcast(packet, BroadcastOptions::new()).await?;
/// assert_eq!(bus.publish_count().await, 1);
/// ```
pub struct InMemoryBus {
    subscriptions: RwLock<HashMap<String, BTreeMap<u64, Arc<dyn MessageHandler>>>>,
    published: RwLock<Vec<PublishedMessage>>,
    next_id: AtomicU64,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    fail_publish: AtomicBool,
}

impl InMemoryBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_subscribe: AtomicBool::new(false),
            fail_unsubscribe: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
        }
    }

    // === Test Helpers ===

    /// Returns every captured publication, oldest first.
    pub async fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published.read().await.clone()
    }

    /// Returns the publications on one channel.
    pub async fn published_on(&self, channel: &str) -> Vec<PublishedMessage> {
        self.published
            .read()
            .await
            .iter()
            .filter(|m| m.channel == channel)
            .cloned()
            .collect()
    }

    /// Returns count of captured publications.
    pub async fn publish_count(&self) -> usize {
        self.published.read().await.len()
    }

    /// Number of handlers subscribed to a channel.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(channel)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    /// Channels with at least one subscriber, sorted.
    pub async fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.subscriptions.read().await.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Clears captured publications (for test isolation).
    pub async fn clear(&self) {
        self.published.write().await.clear();
    }

    /// Makes subsequent subscribe calls fail.
    pub fn fail_subscriptions(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent unsubscribe calls fail.
    pub fn fail_unsubscriptions(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent publish calls fail.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusTransport for InMemoryBus {
    async fn subscribe(
        &self,
        channel: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<SubscriptionHandle, TransportError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TransportError::Subscribe {
                channel: channel.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .write()
            .await
            .entry(channel.to_string())
            .or_default()
            .insert(id, handler);

        Ok(SubscriptionHandle::new(id, channel))
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), TransportError> {
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(TransportError::Unsubscribe {
                channel: handle.channel().to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let mut subscriptions = self.subscriptions.write().await;
        if let Some(handlers) = subscriptions.get_mut(handle.channel()) {
            handlers.remove(&handle.id());
            if handlers.is_empty() {
                subscriptions.remove(handle.channel());
            }
        }

        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Publish {
                channel: channel.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        self.published.write().await.push(PublishedMessage {
            channel: channel.to_string(),
            payload: payload.clone(),
        });

        // Clone handlers to release lock before await points
        let handlers: Vec<Arc<dyn MessageHandler>> = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions
                .get(channel)
                .map(|handlers| handlers.values().cloned().collect())
                .unwrap_or_default()
        };

        for handler in handlers {
            handler.handle(channel, &payload).await;
        }

        Ok(())
    }
}
