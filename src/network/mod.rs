//! A network core for TCP/IP-offload controllers.
//!
//! The offload chip runs the TCP/IP stack itself; the host only reaches it
//! through a byte transport (SPI) and drives each hardware socket by writing
//! commands and polling status registers. This module defines that contract
//! ([`SocketTransport`], [`NetworkInterface`]) and builds the host side on top
//! of it: the per-socket session state machine, DHCP lease acquisition, UDP
//! helpers and the application protocols.
//!

#![deny(unsafe_code)]

use core::net::SocketAddrV4;

use self::config::{MacAddress, NetworkConfig};
use self::error::ChipError;

/// Common error types for network operations
pub mod error;

/// Network configuration record and its JSON loader
pub mod config;

/// Socket session state machine and TCP data helpers
pub mod socket;

/// DHCP lease acquisition with static fallback
pub mod dhcp;

/// UDP datagram helpers and the echo service
pub mod udp;

/// Application-layer protocols carried over a socket session
pub mod application;

/// Re-exports of the transport contract
pub mod prelude {
    pub use super::{
        Interrupts, NetworkInterface, Protocol, SocketFlags, SocketStatus, SocketTransport,
    };
}

/// Number of hardware sockets on the offload chip.
pub const MAX_SOCKETS: u8 = 8;

/// Transport protocol a socket is opened in.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Protocol {
    /// Stream socket.
    Tcp,
    /// Datagram socket.
    Udp,
}

/// Socket status register as reported by the chip.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SocketStatus {
    /// Socket is closed and free.
    Closed,
    /// TCP socket is opened but neither listening nor connected.
    Init,
    /// TCP socket is waiting for a peer to connect.
    Listen,
    /// TCP connection is up.
    Established,
    /// UDP socket is opened and can exchange datagrams.
    UdpReady,
    /// The peer sent FIN; the host still has to close its side.
    CloseWait,
    /// Any of the chip's short-lived intermediate codes (SYN_SENT, FIN_WAIT,
    /// TIME_WAIT, ...), carried as the raw register value.
    Transient(u8),
}

impl SocketStatus {
    /// Decode the raw status register value.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => SocketStatus::Closed,
            0x13 => SocketStatus::Init,
            0x14 => SocketStatus::Listen,
            0x17 => SocketStatus::Established,
            0x1C => SocketStatus::CloseWait,
            0x22 => SocketStatus::UdpReady,
            other => SocketStatus::Transient(other),
        }
    }

    /// The raw status register value.
    pub fn code(self) -> u8 {
        match self {
            SocketStatus::Closed => 0x00,
            SocketStatus::Init => 0x13,
            SocketStatus::Listen => 0x14,
            SocketStatus::Established => 0x17,
            SocketStatus::CloseWait => 0x1C,
            SocketStatus::UdpReady => 0x22,
            SocketStatus::Transient(code) => code,
        }
    }
}

bitflags::bitflags! {
    /// Per-socket interrupt register bits. Each bit stays set until the host
    /// clears it explicitly.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct Interrupts: u8 {
        /// Connection established.
        const CON = 0x01;
        /// FIN or RST received.
        const DISCON = 0x02;
        /// Data is waiting in the receive buffer.
        const RECV = 0x04;
        /// ARP or TCP retransmission timed out.
        const TIMEOUT = 0x08;
        /// A send command completed.
        const SEND_OK = 0x10;
    }
}

bitflags::bitflags! {
    /// Option bits passed when opening a socket.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct SocketFlags: u8 {
        /// Return from send/recv immediately instead of waiting on the chip.
        const NON_BLOCKING = 0x01;
        /// Block unicast datagrams (UDP with multicast).
        const UNICAST_BLOCK = 0x10;
        /// Acknowledge TCP segments without delay.
        const NO_DELAY = 0x20;
        /// Block broadcast datagrams.
        const BROADCAST_BLOCK = 0x40;
        /// Enable UDP multicast.
        const MULTICAST = 0x80;
    }
}

/// Per-socket access to the offload chip.
///
/// Every call is synchronous and may block briefly on the byte transport,
/// never longer. Implementations address the socket by its index
/// (`0..MAX_SOCKETS`); a session owns its index exclusively.
pub trait SocketTransport {
    /// Open `socket` in `protocol` mode bound to `local_port`.
    fn open(
        &mut self,
        socket: u8,
        protocol: Protocol,
        local_port: u16,
        flags: SocketFlags,
    ) -> Result<(), ChipError>;
    /// Start listening on an opened TCP socket.
    fn listen(&mut self, socket: u8) -> Result<(), ChipError>;
    /// Actively connect an opened TCP socket to `peer`.
    fn connect(&mut self, socket: u8, peer: SocketAddrV4) -> Result<(), ChipError>;
    /// Read the status register.
    fn status(&mut self, socket: u8) -> SocketStatus;
    /// Read the interrupt register.
    fn interrupt_flags(&mut self, socket: u8) -> Interrupts;
    /// Clear the given interrupt bits (write-one-to-clear).
    fn clear_interrupts(&mut self, socket: u8, flags: Interrupts);
    /// Bytes waiting in the receive buffer. For UDP this includes the chip's
    /// per-datagram header.
    fn received_length(&mut self, socket: u8) -> u16;
    /// Queue `bytes` on a connected TCP socket.
    fn send(&mut self, socket: u8, bytes: &[u8]) -> Result<usize, ChipError>;
    /// Drain up to `buf.len()` bytes from a TCP socket.
    fn recv(&mut self, socket: u8, buf: &mut [u8]) -> Result<usize, ChipError>;
    /// Send one datagram to `peer`.
    fn send_to(&mut self, socket: u8, bytes: &[u8], peer: SocketAddrV4)
    -> Result<usize, ChipError>;
    /// Receive one datagram payload and its sender.
    fn recv_from(&mut self, socket: u8, buf: &mut [u8])
    -> Result<(usize, SocketAddrV4), ChipError>;
    /// Address of the connected peer (destination registers).
    fn peer(&mut self, socket: u8) -> SocketAddrV4;
    /// Close the socket. Safe to call in any state.
    fn close(&mut self, socket: u8) -> Result<(), ChipError>;
}

/// Chip-wide network settings.
pub trait NetworkInterface {
    /// Program the source hardware address.
    fn set_mac(&mut self, mac: MacAddress);
    /// Push the whole configuration record to the chip in one step.
    fn commit(&mut self, config: &NetworkConfig);
}

#[cfg(feature = "defmt")]
impl defmt::Format for Protocol {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Protocol::Tcp => defmt::write!(f, "Tcp"),
            Protocol::Udp => defmt::write!(f, "Udp"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SocketStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SocketStatus::Closed => defmt::write!(f, "Closed"),
            SocketStatus::Init => defmt::write!(f, "Init"),
            SocketStatus::Listen => defmt::write!(f, "Listen"),
            SocketStatus::Established => defmt::write!(f, "Established"),
            SocketStatus::UdpReady => defmt::write!(f, "UdpReady"),
            SocketStatus::CloseWait => defmt::write!(f, "CloseWait"),
            SocketStatus::Transient(code) => defmt::write!(f, "Transient({=u8:#x})", code),
        }
    }
}
