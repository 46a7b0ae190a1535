//! The relay adapter: local room membership plus cross-node broadcast.
//!
//! # Broadcast Flow
//!
//! ```text
//! broadcast(packet, options)            bus message
//!          │                                 │
//!          │                                 ▼
//!          │                     ┌───────────────────────┐
//!          │                     │  InboundDispatcher     │
//!          │                     │  decode, drop own echo │
//!          │                     └───────────────────────┘
//!          ▼                                 │ Origin::Remote
//! ┌────────────────────────────────────────────────────────┐
//! │ route                                                   │
//! │  1. drop packets of another namespace                   │
//! │  2. snapshot targets from the membership table          │
//! │  3. deliver to each target                              │
//! │  4. Origin::Local only: publish envelope                │
//! │       one room   → room channel                         │
//! │       otherwise  → namespace channel                    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Locking
//!
//! One async mutex guards the membership table together with the
//! subscription set. Joins and leaves hold it across the bus call that their
//! membership change requires. Broadcasts only hold it while taking the
//! target snapshot, so a transport that delivers synchronously (including
//! back to this node) never re-enters a held lock.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use crate::domain::foundation::{ConnectionId, Namespace, NodeId, RoomName};
use crate::domain::relay::{BroadcastOptions, ChannelNamer, Envelope, MembershipTable, Packet};
use crate::ports::{BusTransport, MessageHandler, PacketDelivery};

use super::dispatcher::InboundDispatcher;
use super::error::RelayError;
use super::subscriptions::SubscriptionManager;

/// Where a broadcast entered the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Emitted by the local session registry; published to the bus.
    Local,
    /// Replayed from the bus; delivered locally only.
    Remote,
}

/// Result of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BroadcastOutcome {
    /// Local connections the packet was handed to.
    pub delivered: usize,

    /// Channel the envelope was published on, if it was published.
    pub published_to: Option<String>,
}

struct AdapterState {
    membership: MembershipTable,
    subscriptions: SubscriptionManager,
}

/// Broadcast adapter for one namespace.
///
/// Built through [`RelayAdapterFactory`](super::RelayAdapterFactory) and
/// shared as `Arc<RelayAdapter>`.
pub struct RelayAdapter {
    namespace: Namespace,
    node_id: NodeId,
    namer: ChannelNamer,
    transport: Arc<dyn BusTransport>,
    delivery: Arc<dyn PacketDelivery>,
    dispatcher: Arc<InboundDispatcher>,
    state: Mutex<AdapterState>,
}

impl RelayAdapter {
    /// Create an adapter and subscribe to its namespace channel.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::NamespaceContainsDelimiter` if the namespace
    /// cannot be named unambiguously, and `RelayError::Subscribe` if the
    /// namespace channel cannot be subscribed.
    pub async fn new(
        namespace: Namespace,
        node_id: NodeId,
        namer: ChannelNamer,
        transport: Arc<dyn BusTransport>,
        delivery: Arc<dyn PacketDelivery>,
    ) -> Result<Arc<Self>, RelayError> {
        if !namer.accepts(&namespace) {
            return Err(RelayError::NamespaceContainsDelimiter {
                namespace: namespace.to_string(),
                delimiter: namer.delimiter(),
            });
        }

        let namespace_channel = namer.namespace_channel(&namespace);

        let adapter = Arc::new_cyclic(|weak: &Weak<RelayAdapter>| Self {
            dispatcher: Arc::new(InboundDispatcher::new(weak.clone(), node_id.clone())),
            state: Mutex::new(AdapterState {
                membership: MembershipTable::new(),
                subscriptions: SubscriptionManager::new(
                    transport.clone(),
                    namespace_channel.clone(),
                ),
            }),
            namespace,
            node_id,
            namer,
            transport,
            delivery,
        });

        {
            let mut state = adapter.state.lock().await;
            state
                .subscriptions
                .ensure_subscribed(&namespace_channel, adapter.handler())
                .await
                .map_err(|source| RelayError::Subscribe {
                    channel: namespace_channel.clone(),
                    source,
                })?;
        }

        tracing::info!(
            namespace = %adapter.namespace,
            node_id = %adapter.node_id,
            channel = %namespace_channel,
            "Relay adapter ready"
        );

        Ok(adapter)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn namer(&self) -> &ChannelNamer {
        &self.namer
    }

    /// Channel of a room, or the namespace channel without a room.
    pub fn channel_name(&self, room: Option<&RoomName>) -> String {
        match room {
            Some(room) => self.namer.room_channel(&self.namespace, room),
            None => self.namer.namespace_channel(&self.namespace),
        }
    }

    /// Add a connection to a room, subscribing to the room channel if the
    /// connection is its first local member.
    ///
    /// With no room, the connection is only registered for namespace-wide
    /// broadcasts. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Subscribe` if the room channel cannot be
    /// subscribed; the join is then undone.
    pub async fn join(
        &self,
        connection: &ConnectionId,
        room: Option<&RoomName>,
    ) -> Result<(), RelayError> {
        let mut state = self.state.lock().await;
        let was_known = state.membership.contains(connection);

        let first = state.membership.join(connection, room);
        tracing::debug!(connection = %connection, room = ?room, first, "Joined");

        let Some(room) = room.filter(|_| first) else {
            return Ok(());
        };

        let channel = self.channel_name(Some(room));
        let subscribed = state
            .subscriptions
            .ensure_subscribed(&channel, self.handler())
            .await;

        if let Err(source) = subscribed {
            state.membership.leave(connection, Some(room));
            if !was_known {
                state.membership.leave_all(connection);
            }
            return Err(RelayError::Subscribe { channel, source });
        }

        Ok(())
    }

    /// Remove a connection from a room, unsubscribing from the room channel
    /// once no local member is left.
    ///
    /// Leaving a room one is not in is a no-op.
    pub async fn leave(&self, connection: &ConnectionId, room: Option<&RoomName>) {
        let mut state = self.state.lock().await;

        let emptied = state.membership.leave(connection, room);
        tracing::debug!(connection = %connection, room = ?room, emptied, "Left");

        if let Some(room) = room.filter(|_| emptied) {
            let channel = self.channel_name(Some(room));
            state.subscriptions.ensure_unsubscribed(&channel).await;
        }
    }

    /// Remove a connection from every room and forget it.
    ///
    /// Runs under the adapter lock, so concurrent joins observe either the
    /// state before or after the whole purge.
    pub async fn leave_all(&self, connection: &ConnectionId) {
        let mut state = self.state.lock().await;

        let emptied = state.membership.leave_all(connection);
        tracing::debug!(
            connection = %connection,
            emptied_rooms = emptied.len(),
            "Removed from all rooms"
        );

        for room in &emptied {
            let channel = self.channel_name(Some(room));
            state.subscriptions.ensure_unsubscribed(&channel).await;
        }
    }

    /// Broadcast a locally emitted packet.
    ///
    /// Delivers to matching local connections, then publishes the envelope
    /// for the other nodes.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Publish` if the bus rejects the envelope. Local
    /// delivery has already happened by then.
    pub async fn broadcast(
        &self,
        packet: Packet,
        options: BroadcastOptions,
    ) -> Result<BroadcastOutcome, RelayError> {
        self.route(packet, options, Origin::Local).await
    }

    pub(crate) async fn route(
        &self,
        packet: Packet,
        options: BroadcastOptions,
        origin: Origin,
    ) -> Result<BroadcastOutcome, RelayError> {
        let packet_namespace = packet.namespace();
        if packet_namespace != self.namespace {
            tracing::debug!(
                namespace = %self.namespace,
                packet_namespace = %packet_namespace,
                "Ignoring packet of another namespace"
            );
            return Ok(BroadcastOutcome::default());
        }

        let targets = {
            let state = self.state.lock().await;
            state.membership.targets(&options.rooms, &options.except)
        };

        for connection in &targets {
            self.delivery.deliver(connection, &packet);
        }

        let mut outcome = BroadcastOutcome {
            delivered: targets.len(),
            published_to: None,
        };

        if origin == Origin::Remote {
            return Ok(outcome);
        }

        let channel = self.channel_name(options.single_room());
        let payload = Envelope::new(self.node_id.clone(), packet, options).encode()?;

        self.transport
            .publish(&channel, payload)
            .await
            .map_err(|source| RelayError::Publish {
                channel: channel.clone(),
                source,
            })?;

        tracing::debug!(channel = %channel, delivered = outcome.delivered, "Broadcast published");
        outcome.published_to = Some(channel);
        Ok(outcome)
    }

    /// Rooms a connection belongs to.
    pub async fn rooms_of(&self, connection: &ConnectionId) -> HashSet<RoomName> {
        self.state.lock().await.membership.rooms_of(connection)
    }

    /// Local members of a room.
    pub async fn members_of(&self, room: &RoomName) -> HashSet<ConnectionId> {
        self.state.lock().await.membership.members_of(room)
    }

    /// Local connections in any of `rooms`, or every local connection.
    pub async fn clients(&self, rooms: &[RoomName]) -> BTreeSet<ConnectionId> {
        self.state
            .lock()
            .await
            .membership
            .targets(rooms, &BTreeSet::new())
    }

    /// Rooms with at least one local member.
    pub async fn rooms(&self) -> BTreeSet<RoomName> {
        self.state.lock().await.membership.rooms()
    }

    /// Every connection known to this adapter.
    pub async fn connections(&self) -> BTreeSet<ConnectionId> {
        self.state.lock().await.membership.connections()
    }

    pub async fn contains(&self, connection: &ConnectionId) -> bool {
        self.state.lock().await.membership.contains(connection)
    }

    /// Channels this adapter is subscribed to.
    pub async fn subscribed_channels(&self) -> BTreeSet<String> {
        self.state.lock().await.subscriptions.subscribed_channels()
    }

    pub async fn subscription_count(&self) -> usize {
        self.state.lock().await.subscriptions.subscription_count()
    }

    /// Drop every subscription, the namespace channel included.
    ///
    /// The adapter stops receiving remote broadcasts; local state is kept.
    pub async fn close(&self) {
        self.state.lock().await.subscriptions.close().await;
        tracing::info!(namespace = %self.namespace, "Relay adapter closed");
    }

    fn handler(&self) -> Arc<dyn MessageHandler> {
        self.dispatcher.clone()
    }
}

impl std::fmt::Debug for RelayAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayAdapter")
            .field("namespace", &self.namespace)
            .field("node_id", &self.node_id)
            .field("namer", &self.namer)
            .finish_non_exhaustive()
    }
}
