//! DHCP lease acquisition with static fallback.
//!
//! The DHCP protocol itself is handled by an external client behind
//! [`DhcpClient`]; this module only drives it. [`DhcpLeaseManager::acquire`]
//! steps the client once per attempt, sleeping between attempts, until it
//! reports a lease or the retry ceiling is hit. On success the lease is
//! written into the [`NetworkConfig`]; on failure the static record in force
//! before the attempt is kept. Either way the record is committed to the chip
//! and the DHCP socket is closed before returning, so the socket index can be
//! reused by an application session.

use core::net::Ipv4Addr;

use super::config::NetworkConfig;
use super::error::Error;
use super::{MAX_SOCKETS, NetworkInterface, SocketTransport};
use crate::time::{Clock, retry};

/// Addresses granted by a DHCP server.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Lease {
    /// Assigned local address.
    pub ip: Ipv4Addr,
    /// Default gateway.
    pub gateway: Ipv4Addr,
    /// Subnet mask.
    pub subnet: Ipv4Addr,
    /// DNS server.
    pub dns: Ipv4Addr,
    /// Lease duration in seconds.
    pub lease_time_s: u32,
}

/// Result of one step of the DHCP client.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DhcpRunState {
    /// The exchange failed; the next step starts over.
    Failed,
    /// Discovery or request in progress.
    Running,
    /// An address was assigned for the first time.
    IpAssigned,
    /// A renewal changed the address.
    IpChanged,
    /// The lease is held.
    IpLeased,
    /// The client was stopped.
    Stopped,
}

impl DhcpRunState {
    /// Whether this step ended with usable addresses.
    pub fn has_lease(self) -> bool {
        matches!(
            self,
            DhcpRunState::IpAssigned | DhcpRunState::IpChanged | DhcpRunState::IpLeased
        )
    }
}

/// A DHCP client running over one chip socket.
pub trait DhcpClient {
    /// Prepare to run on `socket`.
    fn init(&mut self, socket: u8);
    /// Advance the exchange by one step.
    fn run(&mut self) -> DhcpRunState;
    /// The addresses of the current lease, if any.
    fn lease(&self) -> Option<Lease>;
    /// Stop the client and release its socket.
    fn stop(&mut self);
}

/// Tuning for [`DhcpLeaseManager`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DhcpOptions {
    /// Socket index the DHCP client uses.
    pub socket: u8,
    /// Run steps before giving up.
    pub max_retry: u32,
    /// Sleep between unsuccessful steps.
    pub retry_interval_ms: u32,
}

impl Default for DhcpOptions {
    fn default() -> Self {
        Self {
            socket: 0,
            max_retry: 30,
            retry_interval_ms: 1000,
        }
    }
}

/// How an acquisition ended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LeaseOutcome {
    /// A lease was obtained and applied.
    Leased(Lease),
    /// Retries ran out; the static record was kept.
    FailedFallback,
}

/// Report of one [`DhcpLeaseManager::acquire`] call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DhcpLeaseAttempt {
    /// Run steps made.
    pub attempts: u32,
    /// How the acquisition ended.
    pub outcome: LeaseOutcome,
}

impl DhcpLeaseAttempt {
    /// The lease, or [`Error::LeaseExhausted`] after a fallback.
    pub fn result(&self) -> Result<Lease, Error> {
        match self.outcome {
            LeaseOutcome::Leased(lease) => Ok(lease),
            LeaseOutcome::FailedFallback => Err(Error::LeaseExhausted),
        }
    }
}

/// Obtains the device's addresses over DHCP.
#[derive(Debug, Clone, Copy)]
pub struct DhcpLeaseManager {
    options: DhcpOptions,
}

impl DhcpLeaseManager {
    /// A manager using `options`. The socket index must exist on the chip.
    pub fn new(options: DhcpOptions) -> Result<Self, Error> {
        if options.socket >= MAX_SOCKETS {
            return Err(Error::InvalidConfig);
        }
        Ok(Self { options })
    }

    /// The options in use.
    pub fn options(&self) -> &DhcpOptions {
        &self.options
    }

    /// Run the DHCP client until it leases or the retry ceiling is reached.
    ///
    /// `config` holds the static record on entry. It is only modified on
    /// success, and then all address fields change together.
    pub fn acquire<T, D, C>(
        &self,
        config: &mut NetworkConfig,
        chip: &mut T,
        dhcp: &mut D,
        clock: &C,
    ) -> DhcpLeaseAttempt
    where
        T: SocketTransport + NetworkInterface,
        D: DhcpClient,
        C: Clock + ?Sized,
    {
        let socket = self.options.socket;
        chip.set_mac(config.mac());
        dhcp.init(socket);
        info!("dhcp: requesting lease on socket {}", socket);

        let mut attempts = 0;
        let leased = retry(clock, self.options.max_retry, self.options.retry_interval_ms, |n| {
            attempts = n + 1;
            let state = dhcp.run();
            match dhcp.lease() {
                Some(lease) if state.has_lease() => Ok(lease),
                _ => {
                    debug!("dhcp: attempt {} -> {:?}", attempts, state);
                    Err(state)
                }
            }
        });

        let outcome = match leased {
            Ok(lease) => {
                config.apply_lease(&lease);
                info!("dhcp: leased {:?} for {}s", lease.ip.octets(), lease.lease_time_s);
                LeaseOutcome::Leased(lease)
            }
            Err(last) => {
                warn!("dhcp: no lease after {} attempts ({:?}), keeping static record", attempts, last);
                LeaseOutcome::FailedFallback
            }
        };

        dhcp.stop();
        chip.commit(config);
        if chip.close(socket).is_err() {
            warn!("dhcp: closing socket {} failed", socket);
        }
        DhcpLeaseAttempt { attempts, outcome }
    }
}

/// Push a static record to the chip: hardware address first, then the rest.
pub fn commit_static<T: NetworkInterface>(config: &NetworkConfig, chip: &mut T) {
    chip.set_mac(config.mac());
    chip.commit(config);
}

#[cfg(feature = "defmt")]
impl defmt::Format for DhcpRunState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DhcpRunState::Failed => defmt::write!(f, "Failed"),
            DhcpRunState::Running => defmt::write!(f, "Running"),
            DhcpRunState::IpAssigned => defmt::write!(f, "IpAssigned"),
            DhcpRunState::IpChanged => defmt::write!(f, "IpChanged"),
            DhcpRunState::IpLeased => defmt::write!(f, "IpLeased"),
            DhcpRunState::Stopped => defmt::write!(f, "Stopped"),
        }
    }
}
