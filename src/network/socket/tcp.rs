use crate::network::error::{ChipCommand, Error};
use crate::network::{Interrupts, SocketStatus, SocketTransport};

use super::send_all;

/// Send all of `bytes` on an established TCP socket.
///
/// Fails with [`Error::NotReady`] when the chip does not report the socket
/// as established.
pub fn send<T: SocketTransport>(transport: &mut T, socket: u8, bytes: &[u8]) -> Result<usize, Error> {
    if transport.status(socket) != SocketStatus::Established {
        return Err(Error::NotReady);
    }
    send_all(transport, socket, bytes)
}

/// Read whatever is waiting on an established TCP socket, without blocking.
///
/// Returns `Ok(0)` when no RECV interrupt is pending. Reads at most
/// `buf.len()` bytes; the rest stays in the chip buffer.
pub fn receive<T: SocketTransport>(transport: &mut T, socket: u8, buf: &mut [u8]) -> Result<usize, Error> {
    if transport.status(socket) != SocketStatus::Established {
        return Err(Error::NotReady);
    }
    if !transport.interrupt_flags(socket).contains(Interrupts::RECV) {
        return Ok(0);
    }
    transport.clear_interrupts(socket, Interrupts::RECV);
    let want = (transport.received_length(socket) as usize).min(buf.len());
    if want == 0 {
        return Ok(0);
    }
    transport
        .recv(socket, &mut buf[..want])
        .map_err(|_| Error::ChipCommandFailed(ChipCommand::Receive))
}
