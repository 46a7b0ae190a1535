//! Relay domain - the pure parts of the broadcast adapter.
//!
//! - [`channel`] - Bus channel naming and room escaping
//! - [`packet`] - Application packets and broadcast options
//! - [`envelope`] - Bus wire envelope codec
//! - [`membership`] - Local room membership index

pub mod channel;
pub mod envelope;
pub mod membership;
pub mod packet;

pub use channel::{channel_name, escape_room, ChannelNamer, DEFAULT_DELIMITER, DEFAULT_PREFIX};
pub use envelope::Envelope;
pub use membership::MembershipTable;
pub use packet::{BroadcastOptions, Packet};
