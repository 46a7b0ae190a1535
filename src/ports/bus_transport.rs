//! BusTransport port - Interface to the shared publish/subscribe bus.
//!
//! The relay only needs four primitives from the bus: connect (done by the
//! concrete transport's constructor), subscribe, unsubscribe and publish.
//! Reconnection and redelivery are the transport's business.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Errors raised by bus transports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The bus could not be reached.
    #[error("Bus connection failed: {0}")]
    Connect(String),

    #[error("Subscribe to '{channel}' failed: {reason}")]
    Subscribe { channel: String, reason: String },

    #[error("Unsubscribe from '{channel}' failed: {reason}")]
    Unsubscribe { channel: String, reason: String },

    #[error("Publish to '{channel}' failed: {reason}")]
    Publish { channel: String, reason: String },
}

/// Receipt for an active subscription, needed to cancel it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    channel: String,
}

impl SubscriptionHandle {
    pub fn new(id: u64, channel: impl Into<String>) -> Self {
        Self {
            id,
            channel: channel.into(),
        }
    }

    /// Transport-assigned subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The subscribed channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.channel, self.id)
    }
}

/// Receives raw payloads from a subscribed channel.
///
/// Implementations must not fail: a payload that cannot be handled is
/// dropped so the subscription keeps flowing.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one payload received on `channel`.
    async fn handle(&self, channel: &str, payload: &[u8]);

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the shared publish/subscribe bus.
///
/// Implementations must ensure:
/// - Every payload published on a channel reaches each handler subscribed to
///   it at least once, including handlers in the publishing process
/// - Unsubscribing an unknown handle succeeds
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Start delivering payloads published on `channel` to `handler`.
    async fn subscribe(
        &self,
        channel: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<SubscriptionHandle, TransportError>;

    /// Stop a subscription.
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), TransportError>;

    /// Publish a payload on `channel`.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}
