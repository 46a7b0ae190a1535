//! Bus transport adapters.
//!
//! Implementations of the `BusTransport` port:
//!
//! - `InMemoryBus` - Synchronous, in-process bus for testing
//! - `RedisBus` - Redis pub/sub for multi-node deployments
//!
//! ## Usage
//!
//! ```ignore
//! use room_relay::adapters::bus::{InMemoryBus, RedisBus};
//!
//! // For testing
//! let bus = Arc::new(InMemoryBus::new());
//!
//! // For production
//! let bus = Arc::new(RedisBus::connect(&config.bus).await?);
//! ```

mod in_memory;
mod redis;

pub use in_memory::{InMemoryBus, PublishedMessage};
pub use self::redis::RedisBus;
