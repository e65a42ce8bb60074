//! Broker liveness probing.
//!
//! A probe sends PINGREQ (`C0 00`) and waits for exactly PINGRESP
//! (`D0 00`). Each attempt has its own time budget; an attempt that ends
//! early still waits out the rest of its budget before the next one, so a
//! full failed probe takes `max_attempts * attempt_timeout_ms`. If the socket
//! is not established before a ping, or its status changes during a wait,
//! the socket is closed and the probe stops at once.

use crate::network::error::{ChipCommand, Error};
use crate::network::socket::{discard, wait_for_recv};
use crate::network::{SocketStatus, SocketTransport};
use crate::time::{Clock, Deadline};

use super::packet::{PINGREQ, PINGRESP};

/// Probe tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveOptions {
    /// Unanswered pings before the link is declared down.
    pub max_attempts: u8,
    /// Budget of one ping.
    pub attempt_timeout_ms: u32,
}

impl Default for KeepaliveOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_timeout_ms: 1000,
        }
    }
}

/// Tracks whether the broker still answers.
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveMonitor {
    options: KeepaliveOptions,
    failures: u8,
    link_up: bool,
}

impl KeepaliveMonitor {
    /// A monitor with the link marked down.
    pub fn new(options: KeepaliveOptions) -> Self {
        Self {
            options,
            failures: 0,
            link_up: false,
        }
    }

    /// Unanswered pings in the most recent probe.
    pub fn failures(&self) -> u8 {
        self.failures
    }

    /// Result of the most recent probe or handshake.
    pub fn is_link_up(&self) -> bool {
        self.link_up
    }

    /// Mark the link up after a successful CONNECT.
    pub fn mark_up(&mut self) {
        self.link_up = true;
        self.failures = 0;
    }

    /// Mark the link down once its connection is gone.
    pub fn mark_down(&mut self) {
        self.link_up = false;
    }

    /// [`probe`](Self::probe), reduced to whether the link is up.
    pub fn check<T, C>(&mut self, transport: &mut T, clock: &C, socket: u8) -> bool
    where
        T: SocketTransport,
        C: Clock + ?Sized,
    {
        self.probe(transport, clock, socket).is_ok()
    }

    /// Ping the broker until it answers or the attempts run out.
    ///
    /// Returns [`Error::KeepaliveTimeout`] after `max_attempts` unanswered
    /// pings and [`Error::ConnectionLost`] (with the socket closed) if the
    /// connection dropped while waiting.
    pub fn probe<T, C>(&mut self, transport: &mut T, clock: &C, socket: u8) -> Result<(), Error>
    where
        T: SocketTransport,
        C: Clock + ?Sized,
    {
        self.failures = 0;
        while self.failures < self.options.max_attempts.max(1) {
            let deadline = Deadline::start(clock, self.options.attempt_timeout_ms);
            match self.ping(transport, clock, socket) {
                Ok(()) => {
                    self.mark_up();
                    return Ok(());
                }
                Err(Error::ConnectionLost) => {
                    warn!("keepalive: socket {} dropped during probe", socket);
                    let _ = transport.close(socket);
                    self.link_up = false;
                    return Err(Error::ConnectionLost);
                }
                Err(err) => {
                    self.failures += 1;
                    debug!("keepalive: ping {} failed: {:?}", self.failures, err);
                    clock.delay_ms(deadline.remaining(clock));
                }
            }
        }
        warn!("keepalive: broker silent after {} pings", self.failures);
        self.link_up = false;
        Err(Error::KeepaliveTimeout)
    }

    fn ping<T, C>(&self, transport: &mut T, clock: &C, socket: u8) -> Result<(), Error>
    where
        T: SocketTransport,
        C: Clock + ?Sized,
    {
        let status = transport.status(socket);
        if status != SocketStatus::Established {
            warn!("keepalive: socket {} is {:?}, not pinging", socket, status);
            return Err(Error::ConnectionLost);
        }
        let sent = transport
            .send(socket, &PINGREQ)
            .map_err(|_| Error::ChipCommandFailed(ChipCommand::Send))?;
        if sent != PINGREQ.len() {
            return Err(Error::ChipCommandFailed(ChipCommand::Send));
        }

        let available = wait_for_recv(
            transport,
            clock,
            socket,
            SocketStatus::Established,
            self.options.attempt_timeout_ms,
        )?;
        let mut reply = [0u8; 2];
        if usize::from(available) != reply.len() {
            discard(transport, socket, usize::from(available))?;
            return Err(Error::ProtocolError);
        }
        transport
            .recv(socket, &mut reply)
            .map_err(|_| Error::ChipCommandFailed(ChipCommand::Receive))?;
        if reply != PINGRESP {
            return Err(Error::ProtocolError);
        }
        Ok(())
    }
}
