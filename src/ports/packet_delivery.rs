//! PacketDelivery port - Hand-off from the relay to the session registry.
//!
//! The session registry owns the sockets. Once the relay has resolved the
//! local targets of a broadcast it calls [`PacketDelivery::deliver`] once per
//! target connection.

use crate::domain::foundation::ConnectionId;
use crate::domain::relay::Packet;

/// Per-connection delivery hook.
///
/// Implementations must not block: delivery is an enqueue onto the
/// connection's outbound buffer. Unknown or closed connections are ignored.
pub trait PacketDelivery: Send + Sync {
    fn deliver(&self, connection: &ConnectionId, packet: &Packet);
}
