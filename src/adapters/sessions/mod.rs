//! Local packet delivery.
//!
//! - `ConnectionHub` - per-connection channels drained by socket tasks
//! - `RecordingDelivery` - records deliveries, for tests

mod hub;
mod recording;

pub use hub::ConnectionHub;
pub use recording::{Delivery, RecordingDelivery};
