//! Socket session state machine.
//!
//! A [`SocketSession`] drives one hardware socket through its lifecycle by
//! polling the chip's status register once per call:
//!
//! ```text
//! Closed ──open──▶ Init ──listen──▶ Listen ──(peer connects)──▶ Established
//!                   │                                               │
//!                   └──────────────connect──────────────────────────┤
//!                                                                   ▼
//!      Closed ◀──close── CloseWait ◀──(peer FIN)── DataExchange ◀───┘
//! ```
//!
//! The decision part is the pure [`transition`] function; [`SocketSession`]
//! only executes the [`Effect`] it returns against a [`SocketTransport`].
//! What happens with received bytes is delegated to a [`DataHandler`]: the
//! [`Echo`] handler reproduces the demo behavior of sending everything back,
//! the MQTT cloud client and the HTTP responder plug in the same way.
//!
//! The session never owns the transport. The caller passes it into every
//! [`poll`](SocketSession::poll), so several sessions on different socket
//! indices can share one chip.

use core::net::{Ipv4Addr, SocketAddrV4};

use super::error::{ChipCommand, Error};
use super::udp;
use super::{Interrupts, MAX_SOCKETS, Protocol, SocketFlags, SocketStatus, SocketTransport};
use crate::time::{Clock, Deadline};

/// TCP send/receive helpers for application-driven traffic.
pub mod tcp;

/// Default size of the per-session data buffer.
pub const DATA_BUFFER_SIZE: usize = 2048;

/// What a socket is used for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Listen on a local port and serve one peer at a time.
    TcpServer,
    /// Connect out to a fixed server.
    TcpClient,
    /// Connect out to an MQTT broker.
    CloudClient,
    /// Exchange datagrams on a local port.
    Udp,
}

impl Role {
    /// Protocol the socket is opened in.
    pub fn protocol(self) -> Protocol {
        match self {
            Role::Udp => Protocol::Udp,
            _ => Protocol::Tcp,
        }
    }

    /// The chip status that means "the session is up" for this role.
    pub fn live_status(self) -> SocketStatus {
        match self {
            Role::Udp => SocketStatus::UdpReady,
            _ => SocketStatus::Established,
        }
    }

    fn connects_out(self) -> bool {
        matches!(self, Role::TcpClient | Role::CloudClient)
    }
}

/// Host-side view of a session.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No socket open.
    Closed,
    /// Socket opened, not yet listening or connected.
    Init,
    /// Waiting for a peer.
    Listen,
    /// Connection is up; the handler has not been started yet.
    Established,
    /// Connection is up and being serviced.
    DataExchange,
    /// The peer half-closed; the socket is being torn down.
    CloseWait,
}

impl SessionState {
    /// Whether the connection is up (`Established` or `DataExchange`).
    pub fn is_established(self) -> bool {
        matches!(self, SessionState::Established | SessionState::DataExchange)
    }
}

/// Side effect requested by [`transition`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Nothing to do this poll.
    None,
    /// Open the socket.
    Open,
    /// Start listening.
    Listen,
    /// Connect to the configured server.
    Connect,
    /// A peer connected on its own; record it and start the handler.
    Accept,
    /// First poll with the connection up; start the handler.
    Handshake,
    /// Check for received data and hand it to the handler.
    Service,
    /// Close the socket.
    Close,
}

/// Decide the next state and effect from the current state and the status
/// the chip reports.
///
/// This is the whole policy of the state machine; it does no I/O.
///
/// ```rust
/// use libw5500::network::SocketStatus;
/// use libw5500::network::socket::{transition, Effect, Role, SessionState};
///
/// let (state, effect) = transition(SessionState::DataExchange, Role::TcpServer, SocketStatus::Closed);
/// assert_eq!((state, effect), (SessionState::Closed, Effect::Close));
/// ```
pub fn transition(state: SessionState, role: Role, observed: SocketStatus) -> (SessionState, Effect) {
    use SessionState as S;
    use SocketStatus as C;

    let live = role.live_status();
    match (state, observed) {
        (S::Established, s) if s == live => (S::DataExchange, Effect::Handshake),
        (S::DataExchange, s) if s == live => (S::DataExchange, Effect::Service),
        (S::Established | S::DataExchange | S::CloseWait, C::CloseWait) => {
            (S::CloseWait, Effect::Close)
        }
        // Anything but the live status mid-session is a lost connection.
        (S::Established | S::DataExchange, _) => (S::Closed, Effect::Close),
        (S::CloseWait, _) => (S::CloseWait, Effect::Close),
        (_, C::CloseWait) => (S::CloseWait, Effect::Close),
        (_, C::Closed) => (S::Closed, Effect::Open),
        (_, C::Transient(_)) => (state, Effect::None),
        (_, C::Init) if role == Role::TcpServer => (S::Init, Effect::Listen),
        (_, C::Init) if role.connects_out() => (S::Init, Effect::Connect),
        (_, C::Listen) if role == Role::TcpServer => (S::Listen, Effect::None),
        (_, C::Established) if live == C::Established => (S::Established, Effect::Accept),
        (_, C::UdpReady) if live == C::UdpReady => (S::Established, Effect::Accept),
        // Status does not fit the role (e.g. a TCP status on a UDP session).
        _ => (S::Closed, Effect::Close),
    }
}

/// Static parameters of a session.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SessionConfig {
    /// Hardware socket index, `0..MAX_SOCKETS`.
    pub socket: u8,
    /// What the socket is used for.
    pub role: Role,
    /// Local port to bind.
    pub local_port: u16,
    /// Server to connect to, required for client roles.
    pub remote: Option<SocketAddrV4>,
    /// Options passed to `open`.
    pub flags: SocketFlags,
}

impl SessionConfig {
    /// A TCP server listening on `port`.
    pub fn tcp_server(socket: u8, port: u16) -> Self {
        Self {
            socket,
            role: Role::TcpServer,
            local_port: port,
            remote: None,
            flags: SocketFlags::NO_DELAY,
        }
    }

    /// A TCP client bound to `local_port` connecting to `server`.
    pub fn tcp_client(socket: u8, local_port: u16, server: SocketAddrV4) -> Self {
        Self {
            socket,
            role: Role::TcpClient,
            local_port,
            remote: Some(server),
            flags: SocketFlags::NO_DELAY,
        }
    }

    /// An MQTT broker connection bound to `local_port`.
    pub fn cloud_client(socket: u8, local_port: u16, broker: SocketAddrV4) -> Self {
        Self {
            role: Role::CloudClient,
            ..Self::tcp_client(socket, local_port, broker)
        }
    }

    /// A UDP socket on `port`.
    pub fn udp(socket: u8, port: u16) -> Self {
        Self {
            socket,
            role: Role::Udp,
            local_port: port,
            remote: None,
            flags: SocketFlags::empty(),
        }
    }
}

/// Outcome of one successful poll.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    /// Nothing changed.
    Idle,
    /// The socket was opened.
    Opened,
    /// The socket is listening.
    Listening,
    /// An outgoing connection was made.
    Connected,
    /// A peer connected to the listening socket.
    Accepted(SocketAddrV4),
    /// The handler started; the session is exchanging data.
    Ready,
    /// This many bytes were received and handed to the handler.
    Received(usize),
    /// The socket was closed on purpose (handler request or idle timeout).
    Closed,
}

/// Whether a handler wants to keep the connection after a callback.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Keep the connection open.
    Keep,
    /// Close the socket; the session restarts from `Closed`.
    Close,
}

/// Access to a live socket handed to a [`DataHandler`].
#[derive(Debug)]
pub struct Link<'a, T: SocketTransport> {
    transport: &'a mut T,
    socket: u8,
    role: Role,
    peer: SocketAddrV4,
}

impl<'a, T: SocketTransport> Link<'a, T> {
    /// Wrap `transport` for `socket`.
    pub fn new(transport: &'a mut T, socket: u8, role: Role, peer: SocketAddrV4) -> Self {
        Self {
            transport,
            socket,
            role,
            peer,
        }
    }

    /// Hardware socket index.
    pub fn socket(&self) -> u8 {
        self.socket
    }

    /// Role of the owning session.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The connected peer, or for UDP the sender of the last datagram.
    pub fn peer(&self) -> SocketAddrV4 {
        self.peer
    }

    /// The underlying transport.
    pub fn transport(&mut self) -> &mut T {
        self.transport
    }

    /// Send all of `bytes` to the peer. For UDP this is one datagram.
    pub fn send(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        match self.role.protocol() {
            Protocol::Tcp => send_all(self.transport, self.socket, bytes),
            Protocol::Udp => self
                .transport
                .send_to(self.socket, bytes, self.peer)
                .map_err(|_| Error::ChipCommandFailed(ChipCommand::Send)),
        }
    }

    /// Wait up to `budget_ms` for received data; see [`wait_for_recv`].
    pub fn wait_for_recv<C: Clock + ?Sized>(&mut self, clock: &C, budget_ms: u32) -> Result<u16, Error> {
        wait_for_recv(
            self.transport,
            clock,
            self.socket,
            self.role.live_status(),
            budget_ms,
        )
    }

    /// Drain up to `buf.len()` received bytes.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.transport
            .recv(self.socket, buf)
            .map_err(|_| Error::ChipCommandFailed(ChipCommand::Receive))
    }

    /// Close the socket.
    pub fn close(&mut self) -> Result<(), Error> {
        self.transport
            .close(self.socket)
            .map_err(|_| Error::ChipCommandFailed(ChipCommand::Close))
    }
}

/// Decides what a session does with its connection.
///
/// Returning an error from any callback closes the socket and the error is
/// reported from [`SocketSession::poll_with`].
pub trait DataHandler {
    /// The connection just came up. `scratch` is the session buffer, free
    /// for building outgoing packets.
    fn on_established<T: SocketTransport>(
        &mut self,
        link: &mut Link<'_, T>,
        scratch: &mut [u8],
    ) -> Result<Disposition, Error> {
        let _ = (link, scratch);
        Ok(Disposition::Keep)
    }

    /// `data` arrived from the peer.
    fn on_data<T: SocketTransport>(
        &mut self,
        link: &mut Link<'_, T>,
        data: &[u8],
    ) -> Result<Disposition, Error>;

    /// A poll found the connection up with nothing received.
    fn on_idle<T: SocketTransport>(&mut self, link: &mut Link<'_, T>) -> Result<Disposition, Error> {
        let _ = link;
        Ok(Disposition::Keep)
    }

    /// The session closed its socket or is about to reopen it. Anything tied
    /// to the previous connection is stale from here on. May be called more
    /// than once per connection.
    fn on_closed(&mut self) {}
}

/// Sends every received payload straight back to its sender.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo<'a> {
    greeting: Option<&'a [u8]>,
}

impl<'a> Echo<'a> {
    /// A plain echo.
    pub const fn new() -> Self {
        Self { greeting: None }
    }

    /// An echo that first sends `greeting` once the connection is up.
    pub const fn with_greeting(greeting: &'a [u8]) -> Self {
        Self {
            greeting: Some(greeting),
        }
    }
}

impl DataHandler for Echo<'_> {
    fn on_established<T: SocketTransport>(
        &mut self,
        link: &mut Link<'_, T>,
        _scratch: &mut [u8],
    ) -> Result<Disposition, Error> {
        if let Some(greeting) = self.greeting {
            link.send(greeting)?;
        }
        Ok(Disposition::Keep)
    }

    fn on_data<T: SocketTransport>(
        &mut self,
        link: &mut Link<'_, T>,
        data: &[u8],
    ) -> Result<Disposition, Error> {
        link.send(data)?;
        Ok(Disposition::Keep)
    }
}

/// One hardware socket and the state of its current connection.
///
/// `N` is the size of the receive buffer the session owns.
#[derive(Debug)]
pub struct SocketSession<const N: usize = DATA_BUFFER_SIZE> {
    config: SessionConfig,
    state: SessionState,
    peer: Option<SocketAddrV4>,
    backlog: bool,
    buffer: [u8; N],
}

impl<const N: usize> SocketSession<N> {
    /// A closed session. Fails with [`Error::InvalidConfig`] for a socket
    /// index the chip does not have or a client role without a server.
    pub fn new(config: SessionConfig) -> Result<Self, Error> {
        if config.socket >= MAX_SOCKETS {
            return Err(Error::InvalidConfig);
        }
        if config.role.connects_out() && config.remote.is_none() {
            return Err(Error::InvalidConfig);
        }
        Ok(Self {
            config,
            state: SessionState::Closed,
            peer: None,
            backlog: false,
            buffer: [0; N],
        })
    }

    /// Current host-side state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session parameters.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Hardware socket index.
    pub fn socket(&self) -> u8 {
        self.config.socket
    }

    /// Role of this session.
    pub fn role(&self) -> Role {
        self.config.role
    }

    /// Peer of the current connection, if any.
    pub fn peer(&self) -> Option<SocketAddrV4> {
        self.peer
    }

    /// Poll once with the [`Echo`] handler.
    pub fn poll<T: SocketTransport>(&mut self, transport: &mut T) -> Result<SessionEvent, Error> {
        self.poll_with(transport, &mut Echo::new())
    }

    /// Poll once: read the chip status, advance the state machine and run
    /// at most one step of I/O.
    ///
    /// Every error leaves the session in a state from which the next poll
    /// retries: a failed open stays `Closed`, a failed connect closes the
    /// socket, a lost connection or handler failure closes the socket and
    /// returns to `Closed`.
    pub fn poll_with<T, H>(&mut self, transport: &mut T, handler: &mut H) -> Result<SessionEvent, Error>
    where
        T: SocketTransport,
        H: DataHandler,
    {
        let socket = self.config.socket;
        let observed = transport.status(socket);
        let was_live = self.state.is_established();
        let (next, effect) = transition(self.state, self.config.role, observed);
        trace!("socket {}: {:?} + {:?} -> {:?}", socket, self.state, observed, effect);

        match effect {
            Effect::None => {
                self.state = next;
                Ok(SessionEvent::Idle)
            }
            Effect::Open => {
                handler.on_closed();
                self.open(transport)
            }
            Effect::Listen => {
                transport.listen(socket).map_err(|err| {
                    warn!("socket {}: listen failed: {:?}", socket, err);
                    Error::ChipCommandFailed(ChipCommand::Listen)
                })?;
                info!("socket {}: listening on port {}", socket, self.config.local_port);
                self.state = SessionState::Listen;
                Ok(SessionEvent::Listening)
            }
            Effect::Connect => self.connect(transport).inspect_err(|_| handler.on_closed()),
            Effect::Accept if self.config.role == Role::Udp => {
                self.state = SessionState::Established;
                self.begin(transport, handler, SessionEvent::Ready)
            }
            Effect::Accept => {
                let peer = transport.peer(socket);
                info!("socket {}: peer {:?}:{} connected", socket, peer.ip().octets(), peer.port());
                self.peer = Some(peer);
                self.state = SessionState::Established;
                self.begin(transport, handler, SessionEvent::Accepted(peer))
            }
            Effect::Handshake => {
                if self.peer.is_none() {
                    self.peer = Some(transport.peer(socket));
                }
                self.begin(transport, handler, SessionEvent::Ready)
            }
            Effect::Service => self.service(transport, handler),
            Effect::Close => {
                let closed = transport.close(socket);
                self.reset();
                handler.on_closed();
                if let Err(err) = closed {
                    warn!("socket {}: close failed: {:?}", socket, err);
                    // CloseWait is kept so the next poll retries the close.
                    self.state = next;
                    return Err(Error::ChipCommandFailed(ChipCommand::Close));
                }
                if was_live || next == SessionState::CloseWait {
                    warn!("socket {}: connection lost, chip reports {:?}", socket, observed);
                    Err(Error::ConnectionLost)
                } else {
                    Ok(SessionEvent::Closed)
                }
            }
        }
    }

    /// Close the socket from any state and return to `Closed`.
    pub fn close<T: SocketTransport>(&mut self, transport: &mut T) -> Result<(), Error> {
        self.reset();
        transport
            .close(self.config.socket)
            .map_err(|_| Error::ChipCommandFailed(ChipCommand::Close))
    }

    /// Run `f` against the live connection with the session buffer as
    /// scratch space, e.g. to publish or send a keepalive between polls.
    /// Fails with [`Error::NotReady`] unless the connection is up and its
    /// handler has started (state `DataExchange`).
    pub fn with_link<T, R, F>(&mut self, transport: &mut T, f: F) -> Result<R, Error>
    where
        T: SocketTransport,
        F: FnOnce(&mut Link<'_, T>, &mut [u8]) -> R,
    {
        if self.state != SessionState::DataExchange {
            return Err(Error::NotReady);
        }
        let peer = self.peer.unwrap_or(UNSPECIFIED);
        let mut link = Link::new(transport, self.config.socket, self.config.role, peer);
        Ok(f(&mut link, &mut self.buffer))
    }

    fn open<T: SocketTransport>(&mut self, transport: &mut T) -> Result<SessionEvent, Error> {
        let config = self.config;
        self.reset();
        match transport.open(config.socket, config.role.protocol(), config.local_port, config.flags) {
            Ok(()) => {
                info!("socket {}: opened on port {}", config.socket, config.local_port);
                self.state = SessionState::Init;
                Ok(SessionEvent::Opened)
            }
            Err(err) => {
                warn!("socket {}: open failed: {:?}", config.socket, err);
                Err(Error::ChipCommandFailed(ChipCommand::Open))
            }
        }
    }

    fn connect<T: SocketTransport>(&mut self, transport: &mut T) -> Result<SessionEvent, Error> {
        let socket = self.config.socket;
        let server = self.config.remote.ok_or(Error::InvalidConfig)?;
        match transport.connect(socket, server) {
            Ok(()) => {
                info!("socket {}: connected to {:?}:{}", socket, server.ip().octets(), server.port());
                self.peer = Some(server);
                self.state = SessionState::Established;
                Ok(SessionEvent::Connected)
            }
            Err(err) => {
                warn!("socket {}: connect failed: {:?}", socket, err);
                // Best effort: the socket is reopened from Closed either way.
                let _ = transport.close(socket);
                self.reset();
                Err(Error::ChipCommandFailed(ChipCommand::Connect))
            }
        }
    }

    /// Start the handler, then serve the first data in the same poll.
    /// `started` is reported when there is nothing to serve yet.
    fn begin<T, H>(&mut self, transport: &mut T, handler: &mut H, started: SessionEvent) -> Result<SessionEvent, Error>
    where
        T: SocketTransport,
        H: DataHandler,
    {
        if self.start(transport, handler)? == Disposition::Close {
            return Ok(SessionEvent::Closed);
        }
        Ok(match self.service(transport, handler)? {
            SessionEvent::Idle => started,
            event => event,
        })
    }

    fn start<T, H>(&mut self, transport: &mut T, handler: &mut H) -> Result<Disposition, Error>
    where
        T: SocketTransport,
        H: DataHandler,
    {
        let socket = self.config.socket;
        let peer = self.peer.unwrap_or(UNSPECIFIED);
        let mut link = Link::new(transport, socket, self.config.role, peer);
        let result = handler.on_established(&mut link, &mut self.buffer);
        self.state = SessionState::DataExchange;
        self.settle(transport, handler, result)
    }

    fn service<T, H>(&mut self, transport: &mut T, handler: &mut H) -> Result<SessionEvent, Error>
    where
        T: SocketTransport,
        H: DataHandler,
    {
        let socket = self.config.socket;
        let role = self.config.role;
        let peer = self.peer.unwrap_or(UNSPECIFIED);

        let flags = transport.interrupt_flags(socket);
        if !flags.contains(Interrupts::RECV) && !self.backlog {
            let mut link = Link::new(transport, socket, role, peer);
            let result = handler.on_idle(&mut link);
            return self.settle(transport, handler, result).map(|disposition| match disposition {
                Disposition::Keep => SessionEvent::Idle,
                Disposition::Close => SessionEvent::Closed,
            });
        }
        if flags.contains(Interrupts::RECV) {
            transport.clear_interrupts(socket, Interrupts::RECV);
        }
        self.backlog = false;

        let length = transport.received_length(socket) as usize;
        let (received, from) = match role.protocol() {
            Protocol::Tcp => {
                if length == 0 {
                    return Ok(SessionEvent::Idle);
                }
                let want = length.min(N);
                let n = transport
                    .recv(socket, &mut self.buffer[..want])
                    .map_err(|_| Error::ChipCommandFailed(ChipCommand::Receive))?;
                // More than one buffer's worth: keep draining on later polls.
                self.backlog = length > want;
                (n, peer)
            }
            Protocol::Udp => {
                match udp::read_datagram(transport, socket, length as u16, &mut self.buffer)? {
                    Some((n, from)) => (n, from),
                    None => return Ok(SessionEvent::Idle),
                }
            }
        };
        debug!("socket {}: received {} bytes", socket, received);

        let mut link = Link::new(transport, socket, role, from);
        let result = handler.on_data(&mut link, &self.buffer[..received]);
        self.settle(transport, handler, result).map(|disposition| match disposition {
            Disposition::Keep => SessionEvent::Received(received),
            Disposition::Close => SessionEvent::Closed,
        })
    }

    /// Apply a handler verdict: close the socket on `Close` or on error.
    fn settle<T, H>(
        &mut self,
        transport: &mut T,
        handler: &mut H,
        result: Result<Disposition, Error>,
    ) -> Result<Disposition, Error>
    where
        T: SocketTransport,
        H: DataHandler,
    {
        match result {
            Ok(Disposition::Keep) => Ok(Disposition::Keep),
            Ok(Disposition::Close) => {
                let closed = self.close(transport);
                handler.on_closed();
                closed.map(|()| Disposition::Close)
            }
            Err(err) => {
                warn!("socket {}: closing after {:?}", self.config.socket, err);
                let _ = self.close(transport);
                handler.on_closed();
                Err(err)
            }
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Closed;
        self.peer = None;
        self.backlog = false;
    }
}

const UNSPECIFIED: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);

/// Wait until the RECV interrupt fires, then clear it and return the number
/// of bytes waiting.
///
/// The status register is re-read on every iteration: if it stops reading
/// `live` the wait ends with [`Error::ConnectionLost`]. After `budget_ms`
/// without data the wait ends with [`Error::Timeout`].
pub fn wait_for_recv<T, C>(
    transport: &mut T,
    clock: &C,
    socket: u8,
    live: SocketStatus,
    budget_ms: u32,
) -> Result<u16, Error>
where
    T: SocketTransport,
    C: Clock + ?Sized,
{
    let deadline = Deadline::start(clock, budget_ms);
    loop {
        if transport.interrupt_flags(socket).contains(Interrupts::RECV) {
            transport.clear_interrupts(socket, Interrupts::RECV);
            return Ok(transport.received_length(socket));
        }
        let status = transport.status(socket);
        if status != live {
            warn!("socket {}: status changed to {:?} while waiting", socket, status);
            return Err(Error::ConnectionLost);
        }
        if deadline.expired(clock) {
            return Err(Error::Timeout);
        }
    }
}

/// Read and drop `length` bytes from a TCP socket.
pub(crate) fn discard<T: SocketTransport>(transport: &mut T, socket: u8, mut length: usize) -> Result<(), Error> {
    let mut sink = [0u8; 64];
    while length > 0 {
        let want = length.min(sink.len());
        let n = transport
            .recv(socket, &mut sink[..want])
            .map_err(|_| Error::ChipCommandFailed(ChipCommand::Receive))?;
        if n == 0 {
            break;
        }
        length -= n;
    }
    Ok(())
}

/// Queue all of `bytes` on a TCP socket.
pub(crate) fn send_all<T: SocketTransport>(transport: &mut T, socket: u8, bytes: &[u8]) -> Result<usize, Error> {
    let mut sent = 0;
    while sent < bytes.len() {
        match transport.send(socket, &bytes[sent..]) {
            Ok(0) | Err(_) => return Err(Error::ChipCommandFailed(ChipCommand::Send)),
            Ok(n) => sent += n,
        }
    }
    Ok(sent)
}
