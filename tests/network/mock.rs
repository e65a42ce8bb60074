//! Scripted offload chip and clock for session tests

use std::cell::Cell;
use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddrV4};

use libw5500::network::config::{MacAddress, NetworkConfig};
use libw5500::network::error::ChipError;
use libw5500::network::prelude::*;
use libw5500::network::udp::UDP_HEADER_LEN;
use libw5500::time::Clock;

/// Adapter calls that change socket state, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(u8, Protocol, u16),
    Listen(u8),
    Connect(u8, SocketAddrV4),
    Close(u8),
}

/// One-socket model of the chip.
///
/// Commands move the status register the way the hardware would. Tests can
/// override what `status` returns with `script`, one entry per read.
#[derive(Debug)]
pub struct MockChip {
    pub status: SocketStatus,
    pub script: VecDeque<SocketStatus>,
    pub calls: Vec<Call>,
    pub peer: SocketAddrV4,
    pub fail_open: bool,
    pub fail_connect: bool,
    pub fail_close: bool,
    /// Each TCP send pops one entry; `Some` bytes arrive as the reply.
    pub replies: VecDeque<Option<Vec<u8>>>,
    pub sent: Vec<u8>,
    pub sent_to: Vec<(Vec<u8>, SocketAddrV4)>,
    pub mac: Option<MacAddress>,
    pub committed: Option<NetworkConfig>,
    inbox: VecDeque<u8>,
    datagrams: VecDeque<(SocketAddrV4, Vec<u8>)>,
    recv_flag: bool,
}

impl MockChip {
    pub fn new() -> Self {
        Self {
            status: SocketStatus::Closed,
            script: VecDeque::new(),
            calls: Vec::new(),
            peer: SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 50), 49152),
            fail_open: false,
            fail_connect: false,
            fail_close: false,
            replies: VecDeque::new(),
            sent: Vec::new(),
            sent_to: Vec::new(),
            mac: None,
            committed: None,
            inbox: VecDeque::new(),
            datagrams: VecDeque::new(),
            recv_flag: false,
        }
    }

    /// A peer connects to the listening socket
    pub fn accept_peer(&mut self) {
        self.status = SocketStatus::Established;
    }

    /// TCP bytes arrive and raise RECV
    pub fn deliver(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes);
        self.recv_flag = true;
    }

    /// A datagram arrives and raises RECV
    pub fn deliver_datagram(&mut self, from: SocketAddrV4, payload: &[u8]) {
        self.datagrams.push_back((from, payload.to_vec()));
        self.recv_flag = true;
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    pub fn closes(&self) -> usize {
        self.calls.iter().filter(|call| matches!(call, Call::Close(_))).count()
    }

    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sent)
    }
}

impl SocketTransport for MockChip {
    fn open(&mut self, socket: u8, protocol: Protocol, local_port: u16, _flags: SocketFlags) -> Result<(), ChipError> {
        self.calls.push(Call::Open(socket, protocol, local_port));
        if self.fail_open {
            return Err(ChipError::Code(-3));
        }
        self.status = match protocol {
            Protocol::Tcp => SocketStatus::Init,
            Protocol::Udp => SocketStatus::UdpReady,
        };
        Ok(())
    }

    fn listen(&mut self, socket: u8) -> Result<(), ChipError> {
        self.calls.push(Call::Listen(socket));
        self.status = SocketStatus::Listen;
        Ok(())
    }

    fn connect(&mut self, socket: u8, peer: SocketAddrV4) -> Result<(), ChipError> {
        self.calls.push(Call::Connect(socket, peer));
        if self.fail_connect {
            return Err(ChipError::Timeout);
        }
        self.peer = peer;
        self.status = SocketStatus::Established;
        Ok(())
    }

    fn status(&mut self, _socket: u8) -> SocketStatus {
        if let Some(next) = self.script.pop_front() {
            self.status = next;
        }
        self.status
    }

    fn interrupt_flags(&mut self, _socket: u8) -> Interrupts {
        if self.recv_flag {
            Interrupts::RECV
        } else {
            Interrupts::empty()
        }
    }

    fn clear_interrupts(&mut self, _socket: u8, flags: Interrupts) {
        if flags.contains(Interrupts::RECV) {
            self.recv_flag = false;
        }
    }

    fn received_length(&mut self, _socket: u8) -> u16 {
        match self.datagrams.front() {
            Some((_, payload)) => payload.len() as u16 + UDP_HEADER_LEN,
            None => self.inbox.len() as u16,
        }
    }

    fn send(&mut self, _socket: u8, bytes: &[u8]) -> Result<usize, ChipError> {
        if self.status != SocketStatus::Established {
            return Err(ChipError::SocketClosed);
        }
        self.sent.extend_from_slice(bytes);
        if let Some(Some(reply)) = self.replies.pop_front() {
            self.deliver(&reply);
        }
        Ok(bytes.len())
    }

    fn recv(&mut self, _socket: u8, buf: &mut [u8]) -> Result<usize, ChipError> {
        let n = buf.len().min(self.inbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn send_to(&mut self, _socket: u8, bytes: &[u8], peer: SocketAddrV4) -> Result<usize, ChipError> {
        self.sent_to.push((bytes.to_vec(), peer));
        Ok(bytes.len())
    }

    fn recv_from(&mut self, _socket: u8, buf: &mut [u8]) -> Result<(usize, SocketAddrV4), ChipError> {
        let (from, payload) = self.datagrams.pop_front().ok_or(ChipError::Busy)?;
        let n = buf.len().min(payload.len());
        buf[..n].copy_from_slice(&payload[..n]);
        if !self.datagrams.is_empty() {
            self.recv_flag = true;
        }
        Ok((n, from))
    }

    fn peer(&mut self, _socket: u8) -> SocketAddrV4 {
        self.peer
    }

    fn close(&mut self, socket: u8) -> Result<(), ChipError> {
        self.calls.push(Call::Close(socket));
        if self.fail_close {
            return Err(ChipError::Busy);
        }
        self.status = SocketStatus::Closed;
        self.inbox.clear();
        self.datagrams.clear();
        self.recv_flag = false;
        Ok(())
    }
}

impl NetworkInterface for MockChip {
    fn set_mac(&mut self, mac: MacAddress) {
        self.mac = Some(mac);
    }

    fn commit(&mut self, config: &NetworkConfig) {
        self.committed = Some(*config);
    }
}

/// Clock that moves forward 1 ms every time it is read
#[derive(Debug, Default)]
pub struct StepClock {
    now: Cell<u32>,
    pub slept: Cell<u32>,
    pub sleeps: Cell<u32>,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(1));
        now
    }

    fn delay_ms(&self, ms: u32) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.slept.set(self.slept.get() + ms);
        self.advance(ms);
    }
}
