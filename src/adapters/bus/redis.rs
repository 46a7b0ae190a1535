//! Redis pub/sub transport for production multi-node deployments.
//!
//! Publishing goes through one shared multiplexed connection. Each
//! subscription gets its own pub/sub connection and a reader task that feeds
//! the handler; unsubscribing aborts the task, which drops the connection
//! and with it the Redis subscription.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::BusConfig;
use crate::ports::{BusTransport, MessageHandler, SubscriptionHandle, TransportError};

/// Redis-backed bus transport.
pub struct RedisBus {
    client: redis::Client,
    publisher: MultiplexedConnection,
    readers: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl RedisBus {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connect` if the URL is invalid or the server
    /// cannot be reached within the configured timeout.
    pub async fn connect(config: &BusConfig) -> Result<Self, TransportError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let publisher = tokio::time::timeout(
            config.timeout(),
            client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| TransportError::Connect("connection timed out".to_string()))?
        .map_err(|e| TransportError::Connect(e.to_string()))?;

        tracing::info!(timeout_secs = config.timeout_secs, "Connected to Redis bus");

        Ok(Self {
            client,
            publisher,
            readers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            timeout: config.timeout(),
        })
    }

    /// Number of live reader tasks.
    pub async fn active_subscriptions(&self) -> usize {
        self.readers.lock().await.len()
    }
}

#[async_trait]
impl BusTransport for RedisBus {
    async fn subscribe(
        &self,
        channel: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<SubscriptionHandle, TransportError> {
        let subscribe_error = |reason: String| TransportError::Subscribe {
            channel: channel.to_string(),
            reason,
        };

        let mut pubsub = tokio::time::timeout(self.timeout, self.client.get_async_connection())
            .await
            .map_err(|_| subscribe_error("connection timed out".to_string()))?
            .map_err(|e: redis::RedisError| subscribe_error(e.to_string()))?
            .into_pubsub();

        pubsub
            .subscribe(channel)
            .await
            .map_err(|e: redis::RedisError| subscribe_error(e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let channel_name = channel.to_string();

        let reader = tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                match msg.get_payload::<Vec<u8>>() {
                    Ok(payload) => handler.handle(&channel_name, &payload).await,
                    Err(e) => tracing::warn!(
                        channel = %channel_name,
                        error = %e,
                        "Dropping Redis message with unreadable payload"
                    ),
                }
            }
            tracing::warn!(channel = %channel_name, "Redis subscription stream ended");
        });

        self.readers.lock().await.insert(id, reader);
        tracing::debug!(channel, id, "Subscribed to Redis channel");

        Ok(SubscriptionHandle::new(id, channel))
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), TransportError> {
        if let Some(reader) = self.readers.lock().await.remove(&handle.id()) {
            reader.abort();
            tracing::debug!(channel = handle.channel(), id = handle.id(), "Unsubscribed from Redis channel");
        }
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let mut conn = self.publisher.clone();

        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e: redis::RedisError| TransportError::Publish {
                channel: channel.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Drop for RedisBus {
    fn drop(&mut self) {
        for (_, reader) in self.readers.get_mut().drain() {
            reader.abort();
        }
    }
}

impl std::fmt::Debug for RedisBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBus")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_rejects_invalid_url() {
        let config = BusConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };

        let result = RedisBus::connect(&config).await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    // Requires a running Redis instance. Run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn publish_reaches_subscriber_and_stops_after_unsubscribe() {
        use std::sync::Mutex as StdMutex;

        #[derive(Default)]
        struct Collect(StdMutex<Vec<(String, Vec<u8>)>>);

        #[async_trait]
        impl MessageHandler for Collect {
            async fn handle(&self, channel: &str, payload: &[u8]) {
                self.0
                    .lock()
                    .unwrap()
                    .push((channel.to_string(), payload.to_vec()));
            }
            fn name(&self) -> &'static str {
                "Collect"
            }
        }

        let config = BusConfig {
            url: "redis://127.0.0.1/".to_string(),
            ..Default::default()
        };
        let bus = RedisBus::connect(&config).await.unwrap();
        let collect = Arc::new(Collect::default());

        let handle = bus.subscribe("room-relay-test", collect.clone()).await.unwrap();
        assert_eq!(bus.active_subscriptions().await, 1);

        bus.publish("room-relay-test", b"woot".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            *collect.0.lock().unwrap(),
            vec![("room-relay-test".to_string(), b"woot".to_vec())]
        );

        bus.unsubscribe(&handle).await.unwrap();
        assert_eq!(bus.active_subscriptions().await, 0);

        bus.publish("room-relay-test", b"late".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(collect.0.lock().unwrap().len(), 1);
    }
}
