//! Local connection registry.
//!
//! Each connected client gets an unbounded channel; the relay adapter hands
//! packets to it through [`PacketDelivery`], and the client's socket task
//! drains the receiver.
//!
//! ```text
//! RelayAdapter ──deliver──▶ ConnectionHub ──tx──▶ client-a task
//!                                        └─tx──▶ client-b task
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc;

use crate::domain::foundation::ConnectionId;
use crate::domain::relay::Packet;
use crate::ports::PacketDelivery;

/// Maps connection ids to their outbound packet channels.
///
/// Uses a std `RwLock` since delivery is synchronous and never awaits while
/// holding it.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Packet>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiver for its packets.
    ///
    /// Registering an id twice replaces the previous channel; the old
    /// receiver then sees the channel closed.
    pub fn connect(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<Packet> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection, tx);
        rx
    }

    /// Forget a connection. Returns `true` if it was registered.
    pub fn disconnect(&self, connection: &ConnectionId) -> bool {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(connection)
            .is_some()
    }

    pub fn is_connected(&self, connection: &ConnectionId) -> bool {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(connection)
    }

    pub fn connection_count(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PacketDelivery for ConnectionHub {
    fn deliver(&self, connection: &ConnectionId, packet: &Packet) {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);

        let Some(tx) = senders.get(connection) else {
            tracing::trace!(connection = %connection, "No local socket for connection");
            return;
        };

        // Receiver gone means the socket is shutting down.
        if tx.send(packet.clone()).is_err() {
            tracing::debug!(connection = %connection, "Socket closed, packet dropped");
        }
    }
}
