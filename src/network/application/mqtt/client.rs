//! Cloud MQTT client running on a socket session.
//!
//! [`CloudClient`] is a [`DataHandler`]: plug it into
//! [`SocketSession::poll_with`](crate::network::socket::SocketSession::poll_with)
//! on a session opened with the cloud-client role. When the TCP connection
//! comes up it sends CONNECT and waits for the broker's CONNACK; only the
//! exact accepting reply `20 02 00 00` brings the client online. Anything
//! else, or no reply within the response timeout, closes the socket and the
//! session starts over.
//!
//! Once online, inbound PUBLISH packets are handed to the application
//! callback and [`keep_alive`](CloudClient::keep_alive) probes the broker
//! with PINGREQ.
//!
//! ```rust,no_run
//! use core::net::{Ipv4Addr, SocketAddrV4};
//! use libw5500::network::application::mqtt::{CloudClient, CloudOptions, QoS};
//! use libw5500::network::socket::{SessionConfig, SocketSession};
//! # use libw5500::network::prelude::*;
//! # use libw5500::time::SysTick;
//! # fn demo<T: SocketTransport>(chip: &mut T) -> Result<(), libw5500::network::error::Error> {
//! static SYSTICK: SysTick = SysTick::new();
//!
//! let broker = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 1883);
//! let mut session: SocketSession = SocketSession::new(SessionConfig::cloud_client(1, 5001, broker))?;
//! let mut cloud = CloudClient::new(CloudOptions::new("device-01"), &SYSTICK)
//!     .on_publish(|topic, payload| {
//!         let _ = (topic, payload);
//!     });
//!
//! loop {
//!     session.poll_with(chip, &mut cloud)?;
//!     if cloud.is_connected() {
//!         session.with_link(chip, |link, buf| cloud.publish(link, buf, "dev/status", b"up", QoS::AtMostOnce, false))??;
//!     }
//! }
//! # }
//! ```

use crate::network::error::Error;
use crate::network::socket::{DataHandler, Disposition, Link, discard};
use crate::network::SocketTransport;
use crate::time::Clock;

use super::keepalive::{KeepaliveMonitor, KeepaliveOptions};
use super::packet::{
    CONNACK_ACCEPTED, PINGRESP_TYPE, PUBLISH, QoS, decode_publish, encode_connect, encode_publish,
    split_frame,
};

/// Called with the topic and payload of every inbound PUBLISH.
pub type PublishCallback = fn(&str, &[u8]);

/// Broker credentials and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudOptions<'a> {
    /// MQTT client identifier.
    pub client_id: &'a str,
    /// User name; left out of CONNECT when empty.
    pub username: &'a str,
    /// Password; left out of CONNECT when empty.
    pub password: &'a str,
    /// How long to wait for CONNACK.
    pub response_timeout_ms: u32,
    /// PINGREQ probing.
    pub keepalive: KeepaliveOptions,
}

impl<'a> CloudOptions<'a> {
    /// Anonymous login as `client_id`.
    pub fn new(client_id: &'a str) -> Self {
        Self {
            client_id,
            username: "",
            password: "",
            response_timeout_ms: 5000,
            keepalive: KeepaliveOptions::default(),
        }
    }

    /// Log in with a user name and password.
    pub fn with_credentials(self, username: &'a str, password: &'a str) -> Self {
        Self {
            username,
            password,
            ..self
        }
    }
}

/// MQTT session over one TCP connection to a broker.
#[derive(Debug)]
pub struct CloudClient<'a, C: Clock> {
    options: CloudOptions<'a>,
    clock: C,
    connected: bool,
    keepalive: KeepaliveMonitor,
    on_publish: Option<PublishCallback>,
}

impl<'a, C: Clock> CloudClient<'a, C> {
    /// An offline client.
    pub fn new(options: CloudOptions<'a>, clock: C) -> Self {
        Self {
            keepalive: KeepaliveMonitor::new(options.keepalive),
            options,
            clock,
            connected: false,
            on_publish: None,
        }
    }

    /// Deliver inbound PUBLISH packets to `callback`.
    pub fn on_publish(mut self, callback: PublishCallback) -> Self {
        self.on_publish = Some(callback);
        self
    }

    /// Whether the broker accepted CONNECT on the current connection and the
    /// link is up. Cleared whenever the session closes its socket.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The keepalive state.
    pub fn keepalive(&self) -> &KeepaliveMonitor {
        &self.keepalive
    }

    /// Send CONNECT and wait for the accepting CONNACK.
    pub fn connect<T: SocketTransport>(&mut self, link: &mut Link<'_, T>, scratch: &mut [u8]) -> Result<(), Error> {
        self.connected = false;
        let options = self.options;
        let len = encode_connect(scratch, options.client_id, options.username, options.password)?;
        link.send(&scratch[..len])?;
        debug!("mqtt: CONNECT sent as {:?}", options.client_id);

        let available = match link.wait_for_recv(&self.clock, options.response_timeout_ms) {
            Ok(available) => usize::from(available),
            Err(Error::Timeout) => {
                warn!("mqtt: no CONNACK within {}ms", options.response_timeout_ms);
                return Err(Error::CloudAuthFailed);
            }
            Err(err) => return Err(err),
        };

        let mut reply = [0u8; CONNACK_ACCEPTED.len()];
        if available != reply.len() {
            warn!("mqtt: unexpected {} byte reply to CONNECT", available);
            let socket = link.socket();
            discard(link.transport(), socket, available)?;
            return Err(Error::CloudAuthFailed);
        }
        let n = link.recv(&mut reply)?;
        if reply[..n] != CONNACK_ACCEPTED {
            warn!("mqtt: CONNECT refused: {:?}", reply);
            return Err(Error::CloudAuthFailed);
        }

        info!("mqtt: connected to broker");
        self.connected = true;
        self.keepalive.mark_up();
        Ok(())
    }

    /// Publish `message` on `topic`, using `buf` to build the packet.
    pub fn publish<T: SocketTransport>(
        &mut self,
        link: &mut Link<'_, T>,
        buf: &mut [u8],
        topic: &str,
        message: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<usize, Error> {
        if !self.connected {
            return Err(Error::NotReady);
        }
        let len = encode_publish(buf, topic, message, false, qos, retain)?;
        link.send(&buf[..len])
    }

    /// Probe the broker with PINGREQ. Returns whether the link is up.
    ///
    /// On `false` the client is offline; reconnecting is up to the caller,
    /// typically by closing the session so the next poll starts over.
    pub fn keep_alive<T: SocketTransport>(&mut self, link: &mut Link<'_, T>) -> bool {
        if !self.connected {
            return false;
        }
        let socket = link.socket();
        self.connected = self.keepalive.check(link.transport(), &self.clock, socket);
        self.connected
    }

    fn dispatch(&self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let Ok((header, body, used)) = split_frame(bytes) else {
                warn!("mqtt: dropping {} undecodable bytes", bytes.len());
                return;
            };
            match header & 0xF0 {
                PUBLISH => match decode_publish(header, body) {
                    Ok(publish) => {
                        debug!("mqtt: PUBLISH on {:?}, {} bytes", publish.topic, publish.payload.len());
                        if let Some(callback) = self.on_publish {
                            callback(publish.topic, publish.payload);
                        }
                    }
                    Err(_) => warn!("mqtt: malformed PUBLISH"),
                },
                PINGRESP_TYPE => trace!("mqtt: PINGRESP"),
                other => debug!("mqtt: ignoring packet type {}", other >> 4),
            }
            bytes = &bytes[used..];
        }
    }
}

impl<C: Clock> DataHandler for CloudClient<'_, C> {
    fn on_established<T: SocketTransport>(
        &mut self,
        link: &mut Link<'_, T>,
        scratch: &mut [u8],
    ) -> Result<Disposition, Error> {
        self.connect(link, scratch)?;
        Ok(Disposition::Keep)
    }

    fn on_data<T: SocketTransport>(&mut self, _link: &mut Link<'_, T>, data: &[u8]) -> Result<Disposition, Error> {
        self.dispatch(data);
        Ok(Disposition::Keep)
    }

    fn on_closed(&mut self) {
        if self.connected {
            info!("mqtt: broker connection closed");
        }
        self.connected = false;
        self.keepalive.mark_down();
    }
}

