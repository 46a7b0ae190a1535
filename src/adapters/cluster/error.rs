//! Errors surfaced by the relay adapter to its callers.

use thiserror::Error;

use crate::domain::foundation::EncodeError;
use crate::ports::TransportError;

/// Errors returned by [`RelayAdapter`](super::RelayAdapter) operations.
///
/// Unknown rooms and connections are never errors, and neither are
/// self-echoes or packets from another namespace.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The transport could not be reached at startup.
    #[error("Bus connection failed: {0}")]
    Connect(#[source] TransportError),

    /// A channel subscription required by a join (or by construction) failed.
    #[error("Subscribe to channel '{channel}' failed")]
    Subscribe {
        channel: String,
        #[source]
        source: TransportError,
    },

    /// The envelope of a local broadcast could not be published.
    #[error("Publish to channel '{channel}' failed")]
    Publish {
        channel: String,
        #[source]
        source: TransportError,
    },

    #[error("Envelope encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// The namespace contains the channel delimiter, so its channels would
    /// collide with room channels of another namespace.
    #[error("Namespace '{namespace}' contains the channel delimiter '{delimiter}'")]
    NamespaceContainsDelimiter { namespace: String, delimiter: char },

    /// Adapter settings could not be turned into a channel naming scheme.
    #[error("Invalid adapter configuration: {0}")]
    Config(String),
}
