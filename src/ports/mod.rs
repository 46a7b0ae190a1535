//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay and the outside world. Adapters implement these ports.
//!
//! - `BusTransport` - The shared publish/subscribe bus
//! - `MessageHandler` - Receiver of raw payloads from a bus subscription
//! - `PacketDelivery` - Per-connection delivery into the session registry

mod bus_transport;
mod packet_delivery;

pub use bus_transport::{BusTransport, MessageHandler, SubscriptionHandle, TransportError};
pub use packet_delivery::PacketDelivery;
