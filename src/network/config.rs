//! Network configuration record.
//!
//! One [`NetworkConfig`] exists per device. It is written once at startup,
//! either from static defaults (optionally loaded from JSON) or by the DHCP
//! lease manager, and then pushed to the chip through
//! [`NetworkInterface::commit`](super::NetworkInterface::commit).

use core::fmt;
use core::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::dhcp::Lease;
use super::error::Error;

/// A 48-bit Ethernet hardware address.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// The raw address bytes.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// How the IPv4 fields of a [`NetworkConfig`] were obtained.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    /// Fixed, configured addresses.
    #[default]
    Static,
    /// Addresses granted by a completed DHCP lease.
    Dhcp,
}

/// The device's network identity.
///
/// The addressing mode and the four address fields are kept consistent: the
/// only way into [`AddressingMode::Dhcp`] is [`apply_lease`](Self::apply_lease),
/// which replaces all four fields at once.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NetworkConfig {
    mac: MacAddress,
    ip: Ipv4Addr,
    gateway: Ipv4Addr,
    subnet: Ipv4Addr,
    dns: Ipv4Addr,
    mode: AddressingMode,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new(
            MacAddress([0x00, 0x08, 0xDC, 0x12, 0x22, 0x12]),
            Ipv4Addr::new(192, 168, 3, 210),
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(255, 255, 255, 0),
            Ipv4Addr::new(144, 144, 144, 144),
        )
    }
}

impl NetworkConfig {
    /// A static configuration.
    pub const fn new(
        mac: MacAddress,
        ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet: Ipv4Addr,
        dns: Ipv4Addr,
    ) -> Self {
        Self {
            mac,
            ip,
            gateway,
            subnet,
            dns,
            mode: AddressingMode::Static,
        }
    }

    /// Parse a static configuration from JSON.
    ///
    /// ```rust
    /// use libw5500::network::config::{AddressingMode, NetworkConfig};
    ///
    /// let json = r#"{
    ///     "mac": [0, 8, 220, 1, 2, 3],
    ///     "ip": [10, 0, 0, 7],
    ///     "gateway": [10, 0, 0, 1],
    ///     "subnet": [255, 255, 255, 0],
    ///     "dns": [1, 1, 1, 1]
    /// }"#;
    /// let config = NetworkConfig::from_json(json).unwrap();
    /// assert_eq!(config.ip().octets(), [10, 0, 0, 7]);
    /// assert_eq!(config.mode(), AddressingMode::Static);
    /// ```
    ///
    /// A record claiming `"mode": "dhcp"` is rejected with
    /// [`Error::InvalidConfig`]: DHCP addresses only come from a lease.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let (record, _) =
            serde_json_core::from_str::<ConfigRecord>(json).map_err(|_| Error::InvalidConfig)?;
        if record.mode != AddressingMode::Static {
            return Err(Error::InvalidConfig);
        }
        Ok(Self::new(
            MacAddress(record.mac),
            Ipv4Addr::from(record.ip),
            Ipv4Addr::from(record.gateway),
            Ipv4Addr::from(record.subnet),
            Ipv4Addr::from(record.dns),
        ))
    }

    /// Serialize the record to JSON, returning the number of bytes written.
    pub fn to_json(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let record = ConfigRecord {
            mac: self.mac.0,
            ip: self.ip.octets(),
            gateway: self.gateway.octets(),
            subnet: self.subnet.octets(),
            dns: self.dns.octets(),
            mode: self.mode,
        };
        serde_json_core::to_slice(&record, buf).map_err(|_| Error::BufferTooSmall)
    }

    /// Replace the address fields with a lease and switch to DHCP mode.
    pub fn apply_lease(&mut self, lease: &Lease) {
        self.ip = lease.ip;
        self.gateway = lease.gateway;
        self.subnet = lease.subnet;
        self.dns = lease.dns;
        self.mode = AddressingMode::Dhcp;
    }

    /// Hardware address.
    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Local IPv4 address.
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Default gateway.
    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }

    /// Subnet mask.
    pub fn subnet(&self) -> Ipv4Addr {
        self.subnet
    }

    /// DNS server.
    pub fn dns(&self) -> Ipv4Addr {
        self.dns
    }

    /// Where the addresses came from.
    pub fn mode(&self) -> AddressingMode {
        self.mode
    }
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            AddressingMode::Dhcp => "DHCP",
            AddressingMode::Static => "Static",
        };
        writeln!(f, "=== NET CONF : {mode} ===")?;
        writeln!(f, "MAC: {}", self.mac)?;
        writeln!(f, "SIP: {}", self.ip)?;
        writeln!(f, "GAR: {}", self.gateway)?;
        writeln!(f, "SUB: {}", self.subnet)?;
        writeln!(f, "DNS: {}", self.dns)?;
        write!(f, "===========================")
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ConfigRecord {
    mac: [u8; 6],
    ip: [u8; 4],
    gateway: [u8; 4],
    subnet: [u8; 4],
    dns: [u8; 4],
    #[serde(default)]
    mode: AddressingMode,
}

#[cfg(feature = "defmt")]
impl defmt::Format for MacAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{:X}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AddressingMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            AddressingMode::Static => defmt::write!(f, "Static"),
            AddressingMode::Dhcp => defmt::write!(f, "DHCP"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NetworkConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "NET CONF {} mac={} ip={} gw={} sn={} dns={}",
            self.mode,
            self.mac,
            self.ip.octets(),
            self.gateway.octets(),
            self.subnet.octets(),
            self.dns.octets()
        )
    }
}
