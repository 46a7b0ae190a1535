//! Local room membership.
//!
//! A bidirectional index kept consistent on every mutation:
//!
//! ```text
//! rooms                         connections
//! ├── lobby → {c1, c2}          ├── c1 → {lobby}
//! └── game  → {c2}              ├── c2 → {lobby, game}
//!                               └── c3 → {}          (default path only)
//! ```
//!
//! A connection appears in a room's set iff the room appears in the
//! connection's set. Every known connection is a target of namespace-wide
//! broadcasts, whether or not it joined any room.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::foundation::{ConnectionId, RoomName};

/// Room membership of the connections served by one adapter.
#[derive(Debug, Default)]
pub struct MembershipTable {
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
    connections: HashMap<ConnectionId, HashSet<RoomName>>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room.
    ///
    /// With no room, only registers the connection on the default broadcast
    /// path. Idempotent.
    ///
    /// # Returns
    ///
    /// `true` if the connection is the room's first member.
    pub fn join(&mut self, connection: &ConnectionId, room: Option<&RoomName>) -> bool {
        let joined = self.connections.entry(connection.clone()).or_default();

        let Some(room) = room else {
            return false;
        };

        joined.insert(room.clone());
        let members = self.rooms.entry(room.clone()).or_default();
        let first = members.is_empty();
        members.insert(connection.clone());
        first
    }

    /// Removes a connection from a room.
    ///
    /// With no room, does nothing: the default path is only released by
    /// [`leave_all`](Self::leave_all). Idempotent.
    ///
    /// # Returns
    ///
    /// `true` if the room has no members after the call.
    pub fn leave(&mut self, connection: &ConnectionId, room: Option<&RoomName>) -> bool {
        let Some(room) = room else {
            return false;
        };

        if let Some(joined) = self.connections.get_mut(connection) {
            joined.remove(room);
        }

        match self.rooms.get_mut(room) {
            Some(members) => {
                members.remove(connection);
                if members.is_empty() {
                    self.rooms.remove(room);
                    true
                } else {
                    false
                }
            }
            None => true,
        }
    }

    /// Removes a connection from every room and forgets it.
    ///
    /// # Returns
    ///
    /// The rooms that became empty, in name order.
    pub fn leave_all(&mut self, connection: &ConnectionId) -> Vec<RoomName> {
        let joined: BTreeSet<RoomName> = self
            .connections
            .get(connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();

        let emptied = joined
            .into_iter()
            .filter(|room| self.leave(connection, Some(room)))
            .collect();

        self.connections.remove(connection);
        emptied
    }

    /// Rooms a connection belongs to. Empty for unknown connections.
    pub fn rooms_of(&self, connection: &ConnectionId) -> HashSet<RoomName> {
        self.connections.get(connection).cloned().unwrap_or_default()
    }

    /// Members of a room. Empty for unknown rooms.
    pub fn members_of(&self, room: &RoomName) -> HashSet<ConnectionId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    /// Whether the connection is known to this table.
    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.connections.contains_key(connection)
    }

    /// Every known connection.
    pub fn connections(&self) -> BTreeSet<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    /// Every room with at least one member.
    pub fn rooms(&self) -> BTreeSet<RoomName> {
        self.rooms.keys().cloned().collect()
    }

    /// Resolves the delivery targets of a broadcast.
    ///
    /// The union of the given rooms' members, or every known connection when
    /// `rooms` is empty, minus `except`.
    pub fn targets(
        &self,
        rooms: &[RoomName],
        except: &BTreeSet<ConnectionId>,
    ) -> BTreeSet<ConnectionId> {
        let candidates: BTreeSet<ConnectionId> = if rooms.is_empty() {
            self.connections.keys().cloned().collect()
        } else {
            rooms
                .iter()
                .filter_map(|room| self.rooms.get(room))
                .flatten()
                .cloned()
                .collect()
        };

        candidates
            .into_iter()
            .filter(|connection| !except.contains(connection))
            .collect()
    }

    /// Whether no connection is known and no room exists.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.rooms.is_empty()
    }
}
