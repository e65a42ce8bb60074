//! # libw5500 - network core for TCP/IP-offload Ethernet controllers
//!
//! Host-side networking for microcontrollers wired to a hardwired TCP/IP
//! chip such as the WIZnet W5500. The chip runs TCP, UDP and IP itself and
//! exposes eight hardware sockets; this crate drives those sockets from a
//! single-threaded cooperative main loop.
//!
//! ## Features
//!
//! ### Socket sessions
//! - Poll-driven state machine per hardware socket (server, client, cloud, UDP)
//! - Pluggable data handlers; echo is the default
//! - Every wait bounded by a millisecond deadline
//!
//! ### Addressing
//! - Static configuration, loadable from JSON
//! - DHCP lease acquisition with bounded retries and static fallback
//!
//! ### Application protocols
//! - MQTT 3.1.1 cloud client: CONNECT/CONNACK, PUBLISH, PINGREQ keepalive
//! - UDP echo service
//! - One-page HTTP responder with query callbacks
//!
//! ## Usage
//!
//! The chip driver implements [`SocketTransport`](network::SocketTransport)
//! and [`NetworkInterface`](network::NetworkInterface); everything else is
//! built on those two traits.
//!
//! ```rust,no_run
//! use core::net::{Ipv4Addr, SocketAddrV4};
//! use libw5500::network::config::NetworkConfig;
//! use libw5500::network::dhcp::commit_static;
//! use libw5500::network::socket::{Echo, SessionConfig, SocketSession};
//! # use libw5500::network::prelude::*;
//! # fn demo<T: SocketTransport + NetworkInterface>(chip: &mut T) -> Result<(), libw5500::network::error::Error> {
//!
//! let config = NetworkConfig::default();
//! commit_static(&config, chip);
//!
//! let server = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 2), 5000);
//! let mut echo_server: SocketSession = SocketSession::new(SessionConfig::tcp_server(0, 5000))?;
//! let mut client: SocketSession = SocketSession::new(SessionConfig::tcp_client(1, 5001, server))?;
//! let mut greeter = Echo::with_greeting(b"Hello World!");
//!
//! loop {
//!     // Errors are local to one session; the next poll starts it over.
//!     let _ = echo_server.poll(chip);
//!     let _ = client.poll_with(chip, &mut greeter);
//! }
//! # }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Log through defmt for probe-attached targets
//! - `log`: Log through the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Socket sessions, addressing and application protocols on top of the
/// offload chip.
pub mod network;

/// Millisecond clock, deadlines and bounded retry.
pub mod time;
