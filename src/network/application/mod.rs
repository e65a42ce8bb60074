//! # Application Layer Protocols
//!
//! Protocols that run on top of a [`SocketSession`](crate::network::socket::SocketSession).
//! Each one is a [`DataHandler`](crate::network::socket::DataHandler), so
//! the session keeps owning the socket lifecycle while the protocol decides
//! what to send and when to close.
//!
//! - **[`mqtt`]**: cloud connection to an MQTT 3.1.1 broker with keepalive
//! - **[`http`]**: one-page HTTP responder with query callbacks
//!
//! Both work in fixed-size buffers and never allocate.

/// HTTP responder.
pub mod http;

/// MQTT cloud client, packet codec and keepalive.
pub mod mqtt;
