//! Application packets and broadcast options.
//!
//! Both types are carried opaquely across the bus: the relay reads only the
//! packet's `nsp` tag and the options' `rooms`/`except` lists. Every other
//! field is preserved as-is so newer senders stay decodable by older nodes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{ConnectionId, Namespace, RoomName};

/// An application-level event as handed to the relay by the session registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Namespace tag. Absent means the root namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsp: Option<Namespace>,

    /// Application-defined fields, never interpreted by the relay.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Packet {
    /// Creates an untagged packet from application fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { nsp: None, fields }
    }

    /// Builds a packet from a JSON object.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not an object or its `nsp` tag is not a string.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Tags the packet with a namespace.
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.nsp = Some(namespace);
        self
    }

    /// Adds an application field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The namespace this packet belongs to, defaulting to the root namespace.
    pub fn namespace(&self) -> Namespace {
        self.nsp.clone().unwrap_or_default()
    }

    /// Reads an application field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Targeting options of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastOptions {
    /// Rooms to target, in order. Empty means every connection.
    #[serde(default)]
    pub rooms: Vec<RoomName>,

    /// Connections to skip.
    #[serde(default)]
    pub except: BTreeSet<ConnectionId>,

    /// Any other option (e.g. `flags`), carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BroadcastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target room.
    pub fn to(mut self, room: impl Into<RoomName>) -> Self {
        self.rooms.push(room.into());
        self
    }

    /// Excludes a connection from delivery.
    pub fn excluding(mut self, connection: impl Into<ConnectionId>) -> Self {
        self.except.insert(connection.into());
        self
    }

    /// The single targeted room, if exactly one room is targeted.
    pub fn single_room(&self) -> Option<&RoomName> {
        match self.rooms.as_slice() {
            [room] => Some(room),
            _ => None,
        }
    }
}
