//! MQTT 3.1.1 for a single cloud connection.
//!
//! The device keeps one TCP connection to a broker. It logs in with
//! CONNECT (clean session, keepalive 100 s, optional user name and
//! password), publishes telemetry and receives commands on topics the
//! broker pushes to it, and checks that the broker is still there with
//! PINGREQ.
//!
//! - [`packet`] builds and parses the raw packets into caller-owned buffers.
//! - [`CloudClient`] runs the login handshake and dispatches inbound packets
//!   as a session [`DataHandler`](crate::network::socket::DataHandler).
//! - [`KeepaliveMonitor`] probes the broker and decides when the link is
//!   down.

/// Allocation-free packet encoding and decoding.
pub mod packet;

/// The broker connection handler.
pub mod client;

/// PINGREQ probing.
pub mod keepalive;

pub use client::{CloudClient, CloudOptions, PublishCallback};
pub use keepalive::{KeepaliveMonitor, KeepaliveOptions};
pub use packet::{
    PacketIdAllocator, Publish, QoS, encode_connect, encode_disconnect, encode_publish,
    encode_publish_with, encode_remaining_length, encode_subscribe,
};
