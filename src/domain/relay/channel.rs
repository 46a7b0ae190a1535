//! Bus channel naming.
//!
//! Every adapter listens on one namespace-wide channel and on one channel
//! per non-empty room:
//!
//! ```text
//! socket.io./chat            namespace-wide
//! socket.io./chat.lobby      room "lobby"
//! socket.io./chat.a%2Eb      room "a.b" (delimiter escaped)
//! ```

use std::fmt::Write;

use crate::domain::foundation::{Namespace, RoomName};

/// Default channel prefix.
pub const DEFAULT_PREFIX: &str = "socket.io";

/// Default delimiter between channel segments.
pub const DEFAULT_DELIMITER: char = '.';

/// Builds the bus channel for a namespace and optional room.
///
/// Without a room: `prefix + delimiter + namespace`.
/// With a room: the namespace channel followed by `delimiter + escape(room)`.
///
/// Namespaces are not escaped; distinct (namespace, room) pairs only map to
/// distinct channels when no namespace contains the delimiter. See
/// [`ChannelNamer::accepts`].
pub fn channel_name(
    namespace: &Namespace,
    prefix: &str,
    delimiter: char,
    room: Option<&RoomName>,
) -> String {
    let mut channel = format!("{}{}{}", prefix, delimiter, namespace);
    if let Some(room) = room {
        channel.push(delimiter);
        channel.push_str(&escape_room(room, delimiter));
    }
    channel
}

/// Percent-encodes a room name so it is safe inside a channel name.
///
/// Everything outside the URL unreserved set is encoded, which covers
/// whitespace, `%` and the bus wildcards `*` and `>`. The delimiter is
/// encoded even when it is unreserved, so a room can never introduce an
/// extra channel segment.
pub fn escape_room(room: &RoomName, delimiter: char) -> String {
    let mut escaped = String::with_capacity(room.as_str().len());
    let mut buf = [0u8; 4];

    for ch in room.as_str().chars() {
        let encoded = ch.encode_utf8(&mut buf);
        if ch == delimiter {
            for byte in encoded.bytes() {
                // Writing to a String cannot fail.
                let _ = write!(escaped, "%{:02X}", byte);
            }
        } else {
            escaped.push_str(&urlencoding::encode(encoded));
        }
    }

    escaped
}

/// Channel naming scheme shared by every adapter of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNamer {
    prefix: String,
    delimiter: char,
}

impl ChannelNamer {
    pub fn new(prefix: impl Into<String>, delimiter: char) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Whether `namespace` can be named without colliding with a room
    /// channel of another namespace.
    pub fn accepts(&self, namespace: &Namespace) -> bool {
        !namespace.as_str().contains(self.delimiter)
    }

    /// The namespace-wide channel.
    pub fn namespace_channel(&self, namespace: &Namespace) -> String {
        channel_name(namespace, &self.prefix, self.delimiter, None)
    }

    /// The channel of a single room.
    pub fn room_channel(&self, namespace: &Namespace, room: &RoomName) -> String {
        channel_name(namespace, &self.prefix, self.delimiter, Some(room))
    }
}

impl Default for ChannelNamer {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn root() -> Namespace {
        Namespace::root()
    }

    #[test]
    fn namespace_channel_joins_prefix_and_namespace() {
        assert_eq!(channel_name(&root(), "socket.io", '.', None), "socket.io./");
        assert_eq!(
            channel_name(&Namespace::from("/test"), "app", ':', None),
            "app:/test"
        );
    }

    #[test]
    fn room_channel_appends_escaped_room() {
        let room = RoomName::from("woot");
        assert_eq!(
            channel_name(&root(), "socket.io", '.', Some(&room)),
            "socket.io./.woot"
        );
    }

    #[test]
    fn delimiter_in_room_is_escaped() {
        let room = RoomName::from("a.b");
        assert_eq!(escape_room(&room, '.'), "a%2Eb");

        let room = RoomName::from("a:b");
        assert_eq!(escape_room(&room, ':'), "a%3Ab");
    }

    #[test]
    fn wildcards_and_whitespace_are_escaped() {
        let room = RoomName::from("a *>\tb");
        assert_eq!(escape_room(&room, '.'), "a%20%2A%3E%09b");
    }

    #[test]
    fn percent_sign_is_escaped() {
        let room = RoomName::from("%2E");
        assert_eq!(escape_room(&room, '.'), "%252E");
    }

    #[test]
    fn non_ascii_room_is_escaped() {
        let room = RoomName::from("café");
        assert_eq!(escape_room(&room, '.'), "caf%C3%A9");
    }

    #[test]
    fn namer_uses_configured_prefix_and_delimiter() {
        let namer = ChannelNamer::new("relay", '/');
        let ns = Namespace::from("chat");
        assert_eq!(namer.namespace_channel(&ns), "relay/chat");
        assert_eq!(namer.room_channel(&ns, &RoomName::from("x/y")), "relay/chat/x%2Fy");
    }

    #[test]
    fn default_namer_matches_defaults() {
        let namer = ChannelNamer::default();
        assert_eq!(namer.prefix(), "socket.io");
        assert_eq!(namer.delimiter(), '.');
    }

    #[test]
    fn namer_rejects_namespace_containing_delimiter() {
        let namer = ChannelNamer::default();
        assert!(namer.accepts(&Namespace::from("/a")));
        assert!(!namer.accepts(&Namespace::from("/a.b")));
        assert!(ChannelNamer::new("socket.io", '#').accepts(&Namespace::from("/a.b")));
    }

    #[test]
    fn room_of_one_namespace_collides_with_dotted_namespace() {
        let namer = ChannelNamer::default();
        assert_eq!(
            namer.room_channel(&Namespace::from("/a"), &RoomName::from("b")),
            namer.namespace_channel(&Namespace::from("/a.b"))
        );
    }

    fn accepted_namespace() -> impl Strategy<Value = Namespace> {
        "/[a-z0-9/_-]{0,8}".prop_map(|s: String| Namespace::new(s))
    }

    fn optional_room() -> impl Strategy<Value = Option<RoomName>> {
        proptest::option::of(".{0,8}".prop_map(|s: String| RoomName::new(s)))
    }

    proptest! {
        #[test]
        fn distinct_namespace_room_pairs_map_to_distinct_channels(
            left in (accepted_namespace(), optional_room()),
            right in (accepted_namespace(), optional_room()),
        ) {
            prop_assume!(left != right);
            let namer = ChannelNamer::default();
            prop_assert!(namer.accepts(&left.0) && namer.accepts(&right.0));

            let name = |(ns, room): &(Namespace, Option<RoomName>)| match room {
                Some(room) => namer.room_channel(ns, room),
                None => namer.namespace_channel(ns),
            };
            prop_assert_ne!(name(&left), name(&right));
        }

        #[test]
        fn distinct_rooms_map_to_distinct_channels(a in ".*", b in ".*") {
            prop_assume!(a != b);
            let ns = root();
            let left = channel_name(&ns, "socket.io", '.', Some(&RoomName::new(a)));
            let right = channel_name(&ns, "socket.io", '.', Some(&RoomName::new(b)));
            prop_assert_ne!(left, right);
        }

        #[test]
        fn escaped_room_never_contains_delimiter_or_wildcards(room in ".*") {
            let escaped = escape_room(&RoomName::new(room), '.');
            prop_assert!(!escaped.contains('.'));
            prop_assert!(!escaped.contains('*'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.chars().any(char::is_whitespace));
        }
    }
}
