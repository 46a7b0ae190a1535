//! Adapters - Implementations of port interfaces.
//!
//! - `bus` - Bus transports (in-memory, Redis pub/sub)
//! - `cluster` - The relay adapter built on a bus transport
//! - `sessions` - Local packet delivery to connected sockets

pub mod bus;
pub mod cluster;
pub mod sessions;

pub use cluster::{RelayAdapter, RelayAdapterFactory, RelayError};
