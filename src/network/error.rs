//! Common error types for network operations

/// The adapter call that the offload chip rejected.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ChipCommand {
    /// Opening a socket in a given protocol mode.
    Open,
    /// Putting a TCP socket into the listen state.
    Listen,
    /// Starting an active TCP connect.
    Connect,
    /// Queueing bytes for transmission.
    Send,
    /// Draining bytes from the receive buffer.
    Receive,
    /// Closing the socket.
    Close,
}

/// A raw failure reported by the transport adapter.
///
/// The offload chip reports failures as small negative status codes. The
/// common ones are named, anything else is carried through untouched.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ChipError {
    /// The socket is busy with a previous command.
    Busy,
    /// The socket was closed underneath the command.
    SocketClosed,
    /// The chip's own retransmission timer expired.
    Timeout,
    /// Any other chip status code.
    Code(i8),
}

/// A common error type for network operations.
///
/// Every variant is locally recoverable: the usual response is to close the
/// socket involved and let the next poll start that session over from
/// `Closed`. Nothing in this crate treats an error as fatal.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The adapter rejected an open/listen/connect/send/receive/close call.
    ChipCommandFailed(ChipCommand),
    /// The peer closed the connection or the chip status left the state the
    /// session expected.
    ConnectionLost,
    /// The broker did not answer CONNECT with an accepting CONNACK.
    CloudAuthFailed,
    /// DHCP retries were exhausted; the static configuration was restored.
    LeaseExhausted,
    /// Every keepalive ping went unanswered.
    KeepaliveTimeout,
    /// A bounded wait ran out of time.
    Timeout,
    /// The operation needs an established (TCP) or ready (UDP) socket.
    NotReady,
    /// The caller-supplied buffer cannot hold the encoded packet.
    BufferTooSmall,
    /// The value exceeds what the MQTT remaining-length field can carry.
    PayloadTooLarge,
    /// Malformed inbound protocol data.
    ProtocolError,
    /// A configuration value is out of range or inconsistent.
    InvalidConfig,
}

impl From<ChipCommand> for Error {
    fn from(command: ChipCommand) -> Self {
        Error::ChipCommandFailed(command)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::ChipCommandFailed(command) => write!(f, "chip rejected {:?} command", command),
            Error::ConnectionLost => f.write_str("connection lost"),
            Error::CloudAuthFailed => f.write_str("broker refused CONNECT"),
            Error::LeaseExhausted => f.write_str("no DHCP lease, static configuration in use"),
            Error::KeepaliveTimeout => f.write_str("broker did not answer PINGREQ"),
            Error::Timeout => f.write_str("timed out"),
            Error::NotReady => f.write_str("socket not ready"),
            Error::BufferTooSmall => f.write_str("buffer too small"),
            Error::PayloadTooLarge => f.write_str("payload too large for MQTT"),
            Error::ProtocolError => f.write_str("malformed protocol data"),
            Error::InvalidConfig => f.write_str("invalid configuration"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChipCommand {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ChipCommand::Open => defmt::write!(f, "Open"),
            ChipCommand::Listen => defmt::write!(f, "Listen"),
            ChipCommand::Connect => defmt::write!(f, "Connect"),
            ChipCommand::Send => defmt::write!(f, "Send"),
            ChipCommand::Receive => defmt::write!(f, "Receive"),
            ChipCommand::Close => defmt::write!(f, "Close"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChipError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ChipError::Busy => defmt::write!(f, "Busy"),
            ChipError::SocketClosed => defmt::write!(f, "SocketClosed"),
            ChipError::Timeout => defmt::write!(f, "Timeout"),
            ChipError::Code(code) => defmt::write!(f, "Code({})", code),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::ChipCommandFailed(command) => {
                defmt::write!(f, "ChipCommandFailed({})", command)
            }
            Error::ConnectionLost => defmt::write!(f, "ConnectionLost"),
            Error::CloudAuthFailed => defmt::write!(f, "CloudAuthFailed"),
            Error::LeaseExhausted => defmt::write!(f, "LeaseExhausted"),
            Error::KeepaliveTimeout => defmt::write!(f, "KeepaliveTimeout"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::NotReady => defmt::write!(f, "NotReady"),
            Error::BufferTooSmall => defmt::write!(f, "BufferTooSmall"),
            Error::PayloadTooLarge => defmt::write!(f, "PayloadTooLarge"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
            Error::InvalidConfig => defmt::write!(f, "InvalidConfig"),
        }
    }
}
