use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::errors::Result;

/// Represents the protocols available for port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortMappingProtocol {
    /// TCP protocol
    TCP,
    /// UDP protocol
    UDP,
}

impl PortMappingProtocol {
    /// Parse a protocol name, ignoring case.
    ///
    /// # Panics
    ///
    /// Panics if `name` is neither `tcp` nor `udp`. Mapping the wrong
    /// protocol is a caller bug, so it is not reported as an error.
    pub fn from_name(name: &str) -> PortMappingProtocol {
        if name.eq_ignore_ascii_case("tcp") {
            PortMappingProtocol::TCP
        } else if name.eq_ignore_ascii_case("udp") {
            PortMappingProtocol::UDP
        } else {
            panic!("invalid protocol: {}", name)
        }
    }
}

impl fmt::Display for PortMappingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                PortMappingProtocol::TCP => "TCP",
                PortMappingProtocol::UDP => "UDP",
            }
        )
    }
}

/// A discovered gateway able to report addresses and map ports.
///
/// Instances are produced by [`discover_natpmp`](crate::discover_natpmp) and
/// [`discover_upnp`](crate::discover_upnp). They are not synchronized: calls
/// on one instance must be serialized by the owner.
pub trait Nat: Send {
    /// Address of the gateway device itself.
    fn device_address(&self) -> Result<IpAddr>;

    /// Address of this host on the gateway's network.
    fn internal_address(&self) -> Result<IpAddr>;

    /// Internet-facing address, queried from the gateway on every call.
    fn external_address(&mut self) -> Result<IpAddr>;

    /// Map `external_port` on the gateway to `internal_port` on this host.
    ///
    /// `protocol` is `"tcp"` or `"udp"` in any case. The mapping expires
    /// after `timeout` unless renewed by calling this again.
    ///
    /// # Panics
    ///
    /// Panics on any other protocol name, before contacting the gateway.
    fn add_port_mapping(
        &mut self,
        protocol: &str,
        internal_port: u16,
        external_port: u16,
        description: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// Remove a mapping previously requested with `add_port_mapping`.
    ///
    /// # Panics
    ///
    /// Panics on a protocol name other than `"tcp"` or `"udp"`.
    fn delete_port_mapping(
        &mut self,
        protocol: &str,
        internal_port: u16,
        external_port: u16,
    ) -> Result<()>;

    /// Label of the backend, `"NAT-PMP"` or the UPnP discovery label.
    fn nat_type(&self) -> &str;
}

impl fmt::Debug for dyn Nat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Nat")
            .field("type", &self.nat_type())
            .field("device", &self.device_address().ok())
            .finish()
    }
}
