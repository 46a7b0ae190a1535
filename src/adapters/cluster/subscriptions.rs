//! Bus subscriptions owned by one adapter.
//!
//! The namespace-wide channel is subscribed once and kept until the adapter
//! is closed. Room channels come and go with room membership; the adapter
//! decides when, this manager makes the calls idempotent.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::ports::{BusTransport, MessageHandler, SubscriptionHandle, TransportError};

/// Channel → subscription handle map for one adapter.
pub struct SubscriptionManager {
    transport: Arc<dyn BusTransport>,
    namespace_channel: String,
    subscriptions: HashMap<String, SubscriptionHandle>,
}

impl SubscriptionManager {
    /// Create an empty manager.
    ///
    /// `namespace_channel` is the one channel that
    /// [`ensure_unsubscribed`](Self::ensure_unsubscribed) never tears down.
    pub fn new(transport: Arc<dyn BusTransport>, namespace_channel: impl Into<String>) -> Self {
        Self {
            transport,
            namespace_channel: namespace_channel.into(),
            subscriptions: HashMap::new(),
        }
    }

    /// Subscribe to `channel` unless already subscribed.
    ///
    /// # Returns
    ///
    /// The new handle, or the existing one.
    ///
    /// # Errors
    ///
    /// Propagates the transport failure; nothing is recorded in that case.
    pub async fn ensure_subscribed(
        &mut self,
        channel: &str,
        on_message: Arc<dyn MessageHandler>,
    ) -> Result<SubscriptionHandle, TransportError> {
        if let Some(handle) = self.subscriptions.get(channel) {
            return Ok(handle.clone());
        }

        let handle = self.transport.subscribe(channel, on_message).await?;
        tracing::debug!(channel, "Subscribed to channel");
        self.subscriptions
            .insert(channel.to_string(), handle.clone());
        Ok(handle)
    }

    /// Unsubscribe from a room channel if subscribed.
    ///
    /// The namespace channel is left alone. A failed unsubscribe is logged
    /// and the handle is kept, so a later join of the same room reuses it.
    ///
    /// # Returns
    ///
    /// `true` if a subscription was removed.
    pub async fn ensure_unsubscribed(&mut self, channel: &str) -> bool {
        if channel == self.namespace_channel {
            return false;
        }
        self.remove(channel).await
    }

    /// Tear down every subscription, the namespace channel included.
    pub async fn close(&mut self) {
        let channels: Vec<String> = self.subscriptions.keys().cloned().collect();
        for channel in channels {
            self.remove(&channel).await;
        }
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.subscriptions.contains_key(channel)
    }

    pub fn subscribed_channels(&self) -> BTreeSet<String> {
        self.subscriptions.keys().cloned().collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn namespace_channel(&self) -> &str {
        &self.namespace_channel
    }

    async fn remove(&mut self, channel: &str) -> bool {
        let Some(handle) = self.subscriptions.get(channel).cloned() else {
            return false;
        };

        match self.transport.unsubscribe(&handle).await {
            Ok(()) => {
                self.subscriptions.remove(channel);
                tracing::debug!(channel, "Unsubscribed from channel");
                true
            }
            Err(e) => {
                tracing::warn!(
                    channel,
                    error = %e,
                    "Unsubscribe failed, keeping subscription"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("namespace_channel", &self.namespace_channel)
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bus::InMemoryBus;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl MessageHandler for NoopHandler {
        async fn handle(&self, _: &str, _: &[u8]) {}
        fn name(&self) -> &'static str {
            "NoopHandler"
        }
    }

    fn manager(bus: &Arc<InMemoryBus>) -> SubscriptionManager {
        SubscriptionManager::new(bus.clone(), "socket.io./")
    }

    #[tokio::test]
    async fn ensure_subscribed_is_idempotent() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);

        let first = subs
            .ensure_subscribed("socket.io./.woot", Arc::new(NoopHandler))
            .await
            .unwrap();
        let second = subs
            .ensure_subscribed("socket.io./.woot", Arc::new(NoopHandler))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(bus.subscriber_count("socket.io./.woot").await, 1);
    }

    #[tokio::test]
    async fn ensure_unsubscribed_removes_room_channel() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);
        subs.ensure_subscribed("socket.io./.woot", Arc::new(NoopHandler))
            .await
            .unwrap();

        assert!(subs.ensure_unsubscribed("socket.io./.woot").await);
        assert!(!subs.is_subscribed("socket.io./.woot"));
        assert_eq!(bus.subscriber_count("socket.io./.woot").await, 0);
    }

    #[tokio::test]
    async fn ensure_unsubscribed_unknown_channel_is_noop() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);

        assert!(!subs.ensure_unsubscribed("socket.io./.ghost").await);
    }

    #[tokio::test]
    async fn namespace_channel_survives_ensure_unsubscribed() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);
        subs.ensure_subscribed("socket.io./", Arc::new(NoopHandler))
            .await
            .unwrap();

        assert_eq!(subs.namespace_channel(), "socket.io./");
        assert!(!subs.ensure_unsubscribed("socket.io./").await);
        assert!(subs.is_subscribed("socket.io./"));
    }

    #[tokio::test]
    async fn failed_subscribe_records_nothing() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);
        bus.fail_subscriptions(true);

        let result = subs
            .ensure_subscribed("socket.io./.woot", Arc::new(NoopHandler))
            .await;

        assert!(result.is_err());
        assert_eq!(subs.subscription_count(), 0);
    }

    #[tokio::test]
    async fn failed_unsubscribe_keeps_handle() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);
        subs.ensure_subscribed("socket.io./.woot", Arc::new(NoopHandler))
            .await
            .unwrap();
        bus.fail_unsubscriptions(true);

        assert!(!subs.ensure_unsubscribed("socket.io./.woot").await);
        assert!(subs.is_subscribed("socket.io./.woot"));
    }

    #[tokio::test]
    async fn close_drops_every_subscription() {
        let bus = Arc::new(InMemoryBus::new());
        let mut subs = manager(&bus);
        subs.ensure_subscribed("socket.io./", Arc::new(NoopHandler))
            .await
            .unwrap();
        subs.ensure_subscribed("socket.io./.woot", Arc::new(NoopHandler))
            .await
            .unwrap();

        subs.close().await;

        assert_eq!(subs.subscription_count(), 0);
        assert!(bus.channels().await.is_empty());
    }
}
