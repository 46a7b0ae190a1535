//! Cluster relay adapter.
//!
//! Keeps the local room membership of one namespace and mirrors broadcasts
//! across nodes through a [`BusTransport`](crate::ports::BusTransport).
//!
//! ## Components
//!
//! - [`RelayAdapter`] - membership, subscriptions and broadcast routing
//! - [`InboundDispatcher`] - decodes bus messages and drops own echoes
//! - [`SubscriptionManager`] - idempotent channel subscriptions
//! - [`RelayAdapterFactory`] - one adapter per namespace, shared node id

mod adapter;
mod dispatcher;
mod error;
mod factory;
mod subscriptions;

pub use adapter::{BroadcastOutcome, Origin, RelayAdapter};
pub use dispatcher::InboundDispatcher;
pub use error::RelayError;
pub use factory::RelayAdapterFactory;
pub use subscriptions::SubscriptionManager;
