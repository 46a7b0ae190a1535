//! Bus wire envelope.
//!
//! An envelope is the ordered triple `[origin, packet, options]` encoded as a
//! JSON array:
//!
//! ```text
//! ["3f2a…", {"nsp":"/","type":2,"data":["woot"]}, {"rooms":[],"except":[]}]
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DecodeError, EncodeError, NodeId};

use super::packet::{BroadcastOptions, Packet};

/// A broadcast in transit between nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub origin: NodeId,
    pub packet: Packet,
    pub options: BroadcastOptions,
}

#[derive(Serialize)]
struct WireRef<'a>(&'a NodeId, &'a Packet, &'a BroadcastOptions);

#[derive(Deserialize)]
struct Wire(NodeId, Packet, BroadcastOptions);

impl Envelope {
    pub fn new(origin: NodeId, packet: Packet, options: BroadcastOptions) -> Self {
        Self {
            origin,
            packet,
            options,
        }
    }

    /// Serializes the envelope to its bus payload.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(&WireRef(
            &self.origin,
            &self.packet,
            &self.options,
        ))?)
    }

    /// Parses a bus payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the payload is not a three-element array of
    /// a string, a packet object and an options object.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let Wire(origin, packet, options) = serde_json::from_slice(payload)?;
        Ok(Self {
            origin,
            packet,
            options,
        })
    }
}
