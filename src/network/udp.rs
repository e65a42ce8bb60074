//! UDP datagram helpers.
//!
//! The chip prefixes every datagram in its receive buffer with an 8-byte
//! header (sender address, port and payload length), and the received
//! length it reports includes that header. Everything here works in payload
//! bytes: the header is subtracted before reading.

use core::net::SocketAddrV4;

use super::error::{ChipCommand, Error};
use super::socket::wait_for_recv;
use super::{SocketStatus, SocketTransport};
use crate::time::Clock;

/// Size of the chip's per-datagram header.
pub const UDP_HEADER_LEN: u16 = 8;

/// Send one datagram to `peer` from a ready UDP socket.
pub fn send_to<T: SocketTransport>(
    transport: &mut T,
    socket: u8,
    payload: &[u8],
    peer: SocketAddrV4,
) -> Result<usize, Error> {
    if transport.status(socket) != SocketStatus::UdpReady {
        return Err(Error::NotReady);
    }
    transport
        .send_to(socket, payload, peer)
        .map_err(|_| Error::ChipCommandFailed(ChipCommand::Send))
}

/// Read one waiting datagram, without blocking.
///
/// Returns `Ok(None)` when nothing carrying a payload is waiting.
pub fn receive_from<T: SocketTransport>(
    transport: &mut T,
    socket: u8,
    buf: &mut [u8],
) -> Result<Option<(usize, SocketAddrV4)>, Error> {
    if transport.status(socket) != SocketStatus::UdpReady {
        return Err(Error::NotReady);
    }
    if !transport.interrupt_flags(socket).contains(super::Interrupts::RECV) {
        return Ok(None);
    }
    transport.clear_interrupts(socket, super::Interrupts::RECV);
    let length = transport.received_length(socket);
    read_datagram(transport, socket, length, buf)
}

/// Wait up to `timeout_ms` for a datagram and send its payload back to the
/// sender unchanged.
///
/// Returns the number of payload bytes echoed, or `Ok(None)` if the wait
/// timed out. If the socket leaves the UDP-ready state during the wait it is
/// closed and [`Error::ConnectionLost`] is returned.
pub fn echo<T, C>(
    transport: &mut T,
    clock: &C,
    socket: u8,
    buf: &mut [u8],
    timeout_ms: u32,
) -> Result<Option<usize>, Error>
where
    T: SocketTransport,
    C: Clock + ?Sized,
{
    let length = match wait_for_recv(transport, clock, socket, SocketStatus::UdpReady, timeout_ms) {
        Ok(length) => length,
        Err(Error::Timeout) => return Ok(None),
        Err(err) => {
            let _ = transport.close(socket);
            return Err(err);
        }
    };
    let Some((n, sender)) = read_datagram(transport, socket, length, buf)? else {
        return Ok(None);
    };
    debug!("udp {}: echo {} bytes to {:?}:{}", socket, n, sender.ip().octets(), sender.port());
    transport
        .send_to(socket, &buf[..n], sender)
        .map_err(|_| Error::ChipCommandFailed(ChipCommand::Send))?;
    Ok(Some(n))
}

/// Read the datagram behind a reported receive `length` (header included).
///
/// A length that does not exceed the header carries no payload and yields
/// `Ok(None)`. A payload longer than `buf` is truncated to `buf.len()`.
pub(crate) fn read_datagram<T: SocketTransport>(
    transport: &mut T,
    socket: u8,
    length: u16,
    buf: &mut [u8],
) -> Result<Option<(usize, SocketAddrV4)>, Error> {
    if length <= UDP_HEADER_LEN {
        return Ok(None);
    }
    let payload = usize::from(length - UDP_HEADER_LEN).min(buf.len());
    transport
        .recv_from(socket, &mut buf[..payload])
        .map(Some)
        .map_err(|_| Error::ChipCommandFailed(ChipCommand::Receive))
}
