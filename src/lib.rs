//! Room Relay - cluster broadcast adapter for room-based realtime servers
//!
//! Keeps per-namespace room membership for local connections and mirrors
//! broadcasts to every other node over a pub/sub bus, so a room spans the
//! whole cluster.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
