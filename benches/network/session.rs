use criterion::{Criterion, Throughput};
use libw5500::network::error::ChipError;
use libw5500::network::prelude::*;
use libw5500::network::socket::{SessionConfig, SessionEvent, SocketSession};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Chip stand-in that has `payload` waiting on every poll
struct LoopbackChip {
    status: SocketStatus,
    payload: Vec<u8>,
    unread: usize,
}

impl LoopbackChip {
    fn refill(&mut self) {
        self.unread = self.payload.len();
    }
}

impl SocketTransport for LoopbackChip {
    fn open(&mut self, _: u8, _: Protocol, _: u16, _: SocketFlags) -> Result<(), ChipError> {
        self.status = SocketStatus::Init;
        Ok(())
    }

    fn listen(&mut self, _: u8) -> Result<(), ChipError> {
        self.status = SocketStatus::Listen;
        Ok(())
    }

    fn connect(&mut self, _: u8, _: SocketAddrV4) -> Result<(), ChipError> {
        self.status = SocketStatus::Established;
        Ok(())
    }

    fn status(&mut self, _: u8) -> SocketStatus {
        self.status
    }

    fn interrupt_flags(&mut self, _: u8) -> Interrupts {
        if self.unread > 0 { Interrupts::RECV } else { Interrupts::empty() }
    }

    fn clear_interrupts(&mut self, _: u8, _: Interrupts) {}

    fn received_length(&mut self, _: u8) -> u16 {
        self.unread as u16
    }

    fn send(&mut self, _: u8, bytes: &[u8]) -> Result<usize, ChipError> {
        Ok(bytes.len())
    }

    fn recv(&mut self, _: u8, buf: &mut [u8]) -> Result<usize, ChipError> {
        let n = buf.len().min(self.unread);
        buf[..n].copy_from_slice(&self.payload[..n]);
        self.unread -= n;
        Ok(n)
    }

    fn send_to(&mut self, _: u8, bytes: &[u8], _: SocketAddrV4) -> Result<usize, ChipError> {
        Ok(bytes.len())
    }

    fn recv_from(&mut self, _: u8, _: &mut [u8]) -> Result<(usize, SocketAddrV4), ChipError> {
        Err(ChipError::Busy)
    }

    fn peer(&mut self, _: u8) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 2), 5000)
    }

    fn close(&mut self, _: u8) -> Result<(), ChipError> {
        self.status = SocketStatus::Closed;
        Ok(())
    }
}

pub fn bench_echo_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    let payload = vec![0xA5u8; 1460];
    group.throughput(Throughput::Bytes(payload.len() as u64));

    let mut chip = LoopbackChip {
        status: SocketStatus::Closed,
        payload,
        unread: 0,
    };
    let server = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 2), 5000);
    let mut session: SocketSession =
        SocketSession::new(SessionConfig::tcp_client(1, 5001, server)).expect("Invalid session");
    while session.poll(&mut chip).expect("Failed to poll") != SessionEvent::Ready {}

    group.bench_function("echo_poll_1460", |b| {
        b.iter(|| {
            chip.refill();
            session.poll(&mut chip).expect("Failed to poll")
        })
    });
    group.finish();
}
