//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers and error types that form the vocabulary
//! of the relay domain.

mod errors;
mod ids;

pub use errors::{DecodeError, EncodeError};
pub use ids::{ConnectionId, Namespace, NodeId, RoomName};
