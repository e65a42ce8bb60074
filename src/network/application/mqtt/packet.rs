//! Allocation-free MQTT 3.1.1 packet encoding.
//!
//! Every encoder writes into a caller-owned buffer through a [`PacketWriter`]
//! cursor and returns the number of bytes written. Nothing here performs I/O.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::network::error::Error;

// MQTT Control Packet types
pub(crate) const CONNECT: u8 = 0x10;
pub(crate) const CONNACK: u8 = 0x20;
pub(crate) const PUBLISH: u8 = 0x30;
pub(crate) const SUBSCRIBE: u8 = 0x82;
pub(crate) const PINGRESP_TYPE: u8 = 0xD0;
pub(crate) const DISCONNECT: u8 = 0xE0;

/// Keepalive probe.
pub const PINGREQ: [u8; 2] = [0xC0, 0x00];
/// Expected answer to [`PINGREQ`].
pub const PINGRESP: [u8; 2] = [0xD0, 0x00];
/// The only CONNACK accepted as a successful login.
pub const CONNACK_ACCEPTED: [u8; 4] = [CONNACK, 0x02, 0x00, 0x00];

/// MQTT 3.1.1 protocol name.
const PROTOCOL_NAME: &[u8] = b"MQTT";
/// MQTT protocol level for version 3.1.1.
const PROTOCOL_LEVEL: u8 = 4;
/// Clean session, password and user name present, no will.
const CONNECT_FLAGS: u8 = 0xC2;
/// Keepalive advertised in CONNECT, in seconds.
pub const KEEP_ALIVE_SECONDS: u16 = 100;
/// Variable header of CONNECT: name length, name, level, flags, keepalive.
const CONNECT_VARIABLE_HEADER_LEN: usize = 10;
/// Largest value the remaining-length field can carry.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// Quality of Service levels for MQTT messages.
///
/// ```rust
/// use libw5500::network::application::mqtt::QoS;
///
/// assert_eq!(QoS::AtMostOnce as u8, 0);
/// assert_eq!(QoS::AtLeastOnce as u8, 1);
/// assert_eq!(QoS::ExactlyOnce as u8, 2);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// **QoS 0**: fire and forget, no packet identifier.
    AtMostOnce = 0,
    /// **QoS 1**: acknowledged delivery, duplicates possible.
    AtLeastOnce = 1,
    /// **QoS 2**: encoded on the wire, but the four-way handshake that
    /// makes it exactly-once is not implemented.
    ExactlyOnce = 2,
}

impl QoS {
    /// Decode the two QoS bits.
    pub fn from_bits(bits: u8) -> Result<Self, Error> {
        match bits {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(Error::ProtocolError),
        }
    }
}

/// Source of PUBLISH/SUBSCRIBE packet identifiers.
///
/// Identifiers increase by one per allocation and wrap from `0xFFFF` to `0`.
/// An identifier is not handed out again until 65 536 further allocations
/// have happened, which is far beyond the single in-flight publish this
/// client ever keeps.
#[derive(Debug, Default)]
pub struct PacketIdAllocator {
    next: AtomicU16,
}

impl PacketIdAllocator {
    /// An allocator whose first identifier is `0`.
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// An allocator whose first identifier is `first`.
    pub const fn starting_at(first: u16) -> Self {
        Self {
            next: AtomicU16::new(first),
        }
    }

    /// Take the next identifier.
    pub fn allocate(&self) -> u16 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Process-wide identifier counter used by [`encode_publish`].
static PACKET_IDS: PacketIdAllocator = PacketIdAllocator::new();

/// Write cursor over a caller-owned packet buffer.
#[derive(Debug)]
pub struct PacketWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> PacketWriter<'a> {
    /// Start writing at the beginning of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Append one byte.
    pub fn put_u8(&mut self, byte: u8) -> Result<(), Error> {
        self.put_bytes(&[byte])
    }

    /// Append a big-endian 16-bit integer.
    pub fn put_u16(&mut self, value: u16) -> Result<(), Error> {
        self.put_bytes(&value.to_be_bytes())
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self.pos + bytes.len();
        let dst = self.buf.get_mut(self.pos..end).ok_or(Error::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    /// Append a length-prefixed MQTT string.
    pub fn put_str(&mut self, value: &[u8]) -> Result<(), Error> {
        let len = u16::try_from(value.len()).map_err(|_| Error::PayloadTooLarge)?;
        self.put_u16(len)?;
        self.put_bytes(value)
    }

    /// Append a remaining-length varint.
    pub fn put_remaining_length(&mut self, len: usize) -> Result<(), Error> {
        let mut scratch = [0u8; 4];
        let n = encode_remaining_length(&mut scratch, len)?;
        self.put_bytes(&scratch[..n])
    }

    /// Finish and return the total packet length.
    pub fn finish(self) -> usize {
        self.pos
    }
}

/// Encode `len` as an MQTT remaining-length varint into `buf`.
///
/// Seven data bits per byte, least significant group first, bit 7 set on
/// every byte but the last. Returns the number of bytes used (1..=4).
pub fn encode_remaining_length(buf: &mut [u8], mut len: usize) -> Result<usize, Error> {
    if len > MAX_REMAINING_LENGTH {
        return Err(Error::PayloadTooLarge);
    }
    let mut i = 0;
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        *buf.get_mut(i).ok_or(Error::BufferTooSmall)? = byte;
        i += 1;
        if len == 0 {
            return Ok(i);
        }
    }
}

/// Decode a remaining-length varint from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode_remaining_length(bytes: &[u8]) -> Result<(usize, usize), Error> {
    let mut value = 0usize;
    let mut multiplier = 1usize;
    for (i, &byte) in bytes.iter().enumerate().take(4) {
        value += (byte & 0x7F) as usize * multiplier;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        multiplier *= 128;
    }
    Err(Error::ProtocolError)
}

/// Build a CONNECT packet into `buf`.
///
/// The variable header is fixed: protocol `MQTT` level 4, connect flags
/// `0xC2`, keepalive 100 s. The payload carries `client_id`, then
/// `username` and `password`; each of the latter two is left out entirely
/// when empty.
///
/// ```rust
/// use libw5500::network::application::mqtt::encode_connect;
///
/// let mut buf = [0u8; 64];
/// let len = encode_connect(&mut buf, "dev", "", "").unwrap();
/// assert_eq!(
///     &buf[..len],
///     &[0x10, 15, 0, 4, b'M', b'Q', b'T', b'T', 4, 0xC2, 0, 100, 0, 3, b'd', b'e', b'v']
/// );
/// ```
pub fn encode_connect(
    buf: &mut [u8],
    client_id: &str,
    username: &str,
    password: &str,
) -> Result<usize, Error> {
    let optional = |field: &str| if field.is_empty() { 0 } else { 2 + field.len() };
    let remaining_len = CONNECT_VARIABLE_HEADER_LEN
        + 2
        + client_id.len()
        + optional(username)
        + optional(password);

    let mut w = PacketWriter::new(buf);

    // --- Fixed Header ---
    w.put_u8(CONNECT)?;
    w.put_remaining_length(remaining_len)?;

    // --- Variable Header ---
    w.put_str(PROTOCOL_NAME)?;
    w.put_u8(PROTOCOL_LEVEL)?;
    w.put_u8(CONNECT_FLAGS)?;
    w.put_u16(KEEP_ALIVE_SECONDS)?;

    // --- Payload ---
    w.put_str(client_id.as_bytes())?;
    if !username.is_empty() {
        w.put_str(username.as_bytes())?;
    }
    if !password.is_empty() {
        w.put_str(password.as_bytes())?;
    }

    Ok(w.finish())
}

/// Build a PUBLISH packet into `buf`, drawing the packet identifier from the
/// process-wide counter.
///
/// The fixed header byte is `0x30 | dup << 3 | qos << 2 | retain`. A
/// packet identifier is only written (and only consumed from the counter)
/// when `qos` is above [`QoS::AtMostOnce`]. The message runs to the end of
/// the packet without a length prefix.
pub fn encode_publish(
    buf: &mut [u8],
    topic: &str,
    message: &[u8],
    dup: bool,
    qos: QoS,
    retain: bool,
) -> Result<usize, Error> {
    encode_publish_with(&PACKET_IDS, buf, topic, message, dup, qos, retain)
}

/// [`encode_publish`] with an explicit identifier source.
pub fn encode_publish_with(
    ids: &PacketIdAllocator,
    buf: &mut [u8],
    topic: &str,
    message: &[u8],
    dup: bool,
    qos: QoS,
    retain: bool,
) -> Result<usize, Error> {
    let has_id = qos != QoS::AtMostOnce;
    let remaining_len = 2 + topic.len() + if has_id { 2 } else { 0 } + message.len();
    let header = PUBLISH | ((dup as u8) << 3) | ((qos as u8) << 2) | (retain as u8);

    let mut w = PacketWriter::new(buf);

    // Size check first so a failed encode does not burn an identifier.
    let total = 1 + varint_len(remaining_len)? + remaining_len;
    if total > w.buf.len() {
        return Err(Error::BufferTooSmall);
    }

    w.put_u8(header)?;
    w.put_remaining_length(remaining_len)?;
    w.put_str(topic.as_bytes())?;
    if has_id {
        w.put_u16(ids.allocate())?;
    }
    w.put_bytes(message)?;

    Ok(w.finish())
}

/// Build a single-topic SUBSCRIBE packet into `buf`.
pub fn encode_subscribe(
    buf: &mut [u8],
    packet_id: u16,
    topic: &str,
    qos: QoS,
) -> Result<usize, Error> {
    let remaining_len = 2 + 2 + topic.len() + 1;
    let mut w = PacketWriter::new(buf);
    w.put_u8(SUBSCRIBE)?;
    w.put_remaining_length(remaining_len)?;
    w.put_u16(packet_id)?;
    w.put_str(topic.as_bytes())?;
    w.put_u8(qos as u8)?;
    Ok(w.finish())
}

/// Build a DISCONNECT packet into `buf`.
pub fn encode_disconnect(buf: &mut [u8]) -> Result<usize, Error> {
    let mut w = PacketWriter::new(buf);
    w.put_u8(DISCONNECT)?;
    w.put_u8(0)?;
    Ok(w.finish())
}

/// An inbound PUBLISH borrowed from the receive buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Publish<'a> {
    /// Topic the message was published to.
    pub topic: &'a str,
    /// Delivery level requested by the sender.
    pub qos: QoS,
    /// Packet identifier, present for QoS above 0.
    pub packet_id: Option<u16>,
    /// Whether the broker flagged the message as retained.
    pub retain: bool,
    /// Message body.
    pub payload: &'a [u8],
}

/// Split the first complete packet off the front of `bytes`.
///
/// Returns the fixed header byte, the packet body (everything after the
/// remaining-length field) and the total length consumed.
pub fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8], usize), Error> {
    let (&header, rest) = bytes.split_first().ok_or(Error::ProtocolError)?;
    let (remaining_len, varint_len) = decode_remaining_length(rest)?;
    let body_start = 1 + varint_len;
    let body = bytes
        .get(body_start..body_start + remaining_len)
        .ok_or(Error::ProtocolError)?;
    Ok((header, body, body_start + remaining_len))
}

/// Parse the body of a PUBLISH packet whose fixed header byte is `header`.
pub fn decode_publish(header: u8, body: &[u8]) -> Result<Publish<'_>, Error> {
    if header & 0xF0 != PUBLISH {
        return Err(Error::ProtocolError);
    }
    let qos = QoS::from_bits((header >> 1) & 0x03)?;
    let topic_len = body
        .get(..2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]) as usize)
        .ok_or(Error::ProtocolError)?;
    let topic_bytes = body.get(2..2 + topic_len).ok_or(Error::ProtocolError)?;
    let topic = core::str::from_utf8(topic_bytes).map_err(|_| Error::ProtocolError)?;

    let mut offset = 2 + topic_len;
    let packet_id = if qos != QoS::AtMostOnce {
        let id = body.get(offset..offset + 2).ok_or(Error::ProtocolError)?;
        offset += 2;
        Some(u16::from_be_bytes([id[0], id[1]]))
    } else {
        None
    };

    Ok(Publish {
        topic,
        qos,
        packet_id,
        retain: header & 0x01 != 0,
        payload: &body[offset..],
    })
}

fn varint_len(len: usize) -> Result<usize, Error> {
    let mut scratch = [0u8; 4];
    encode_remaining_length(&mut scratch, len)
}
