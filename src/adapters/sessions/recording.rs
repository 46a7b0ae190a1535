use std::sync::{Mutex, PoisonError};

use crate::domain::foundation::ConnectionId;
use crate::domain::relay::Packet;
use crate::ports::PacketDelivery;

/// One packet handed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub connection: ConnectionId,
    pub packet: Packet,
}

/// [`PacketDelivery`] that only records what it was given.
///
/// For tests and for nodes that relay without local sockets.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery so far, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Packets handed to `connection`, in order.
    pub fn packets_for(&self, connection: &ConnectionId) -> Vec<Packet> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| &d.connection == connection)
            .map(|d| d.packet.clone())
            .collect()
    }

    pub fn count_for(&self, connection: &ConnectionId) -> usize {
        self.packets_for(connection).len()
    }

    pub fn total(&self) -> usize {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear(&self) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl PacketDelivery for RecordingDelivery {
    fn deliver(&self, connection: &ConnectionId, packet: &Packet) {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                connection: connection.clone(),
                packet: packet.clone(),
            });
    }
}
