//! NAT-PMP backend.
//!
//! The gateway is the host's default route. Discovery queries it with an
//! external address request; a gateway that answers is published as a
//! [`NatPmp`].

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::thread;
use std::time::Duration;

use natpmp::{Natpmp, Response};

use crate::common::{self, interfaces, DiscoveryOptions};
use crate::discovery::Discovery;
use crate::errors::{Error, Result};
use crate::nat::{Nat, PortMappingProtocol};

/// `nat_type()` of the NAT-PMP backend.
pub const NAT_PMP: &str = "NAT-PMP";

/// Answer to a NAT-PMP mapping request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayMapping {
    /// External port the gateway actually assigned.
    pub mapped_external_port: u16,
    /// Lease granted by the gateway.
    pub lifetime: Duration,
}

/// The NAT-PMP requests the backend relies on.
pub trait PmpClient: Send {
    /// Ask the gateway for its external address, as raw IPv4 octets.
    fn external_address(&mut self) -> Result<[u8; 4]>;

    /// Request a mapping. An `external_port` and `lifetime` of 0 deletes it.
    fn add_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        internal_port: u16,
        external_port: u16,
        lifetime: u32,
    ) -> Result<GatewayMapping>;
}

/// A [`natpmp::Natpmp`] client together with its polling interval.
pub struct NatpmpClient {
    client: Natpmp,
    poll_interval: Duration,
}

impl NatpmpClient {
    /// Create a client talking to `gateway`.
    pub fn new(gateway: Ipv4Addr, poll_interval: Duration) -> Result<NatpmpClient> {
        let client = Natpmp::new_with(gateway)?;
        Ok(NatpmpClient {
            client,
            poll_interval,
        })
    }

    // The client retransmits internally and eventually gives up with an
    // error; until then it reports NATPMP_TRYAGAIN.
    fn read_response(&mut self) -> Result<Response> {
        loop {
            match self.client.read_response_or_retry() {
                Ok(response) => return Ok(response),
                Err(natpmp::Error::NATPMP_TRYAGAIN) => thread::sleep(self.poll_interval),
                Err(err) => return Err(Error::from(err)),
            }
        }
    }
}

impl PmpClient for NatpmpClient {
    fn external_address(&mut self) -> Result<[u8; 4]> {
        self.client.send_public_address_request()?;
        match self.read_response()? {
            Response::Gateway(gateway) => Ok(gateway.public_address().octets()),
            _ => Err(Error::NoExternalAddress),
        }
    }

    fn add_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        internal_port: u16,
        external_port: u16,
        lifetime: u32,
    ) -> Result<GatewayMapping> {
        let protocol = match protocol {
            PortMappingProtocol::TCP => natpmp::Protocol::TCP,
            PortMappingProtocol::UDP => natpmp::Protocol::UDP,
        };
        self.client
            .send_port_mapping_request(protocol, internal_port, external_port, lifetime)?;
        match self.read_response()? {
            Response::TCP(mapping) | Response::UDP(mapping) => Ok(GatewayMapping {
                mapped_external_port: mapping.public_port(),
                lifetime: *mapping.lifetime(),
            }),
            Response::Gateway(_) => Err(Error::IoError(io::Error::new(
                io::ErrorKind::InvalidData,
                "gateway answered a mapping request with its address",
            ))),
        }
    }
}

/// A gateway reached over NAT-PMP.
pub struct NatPmp<C> {
    client: C,
    gateway: Ipv4Addr,
}

impl<C: PmpClient> NatPmp<C> {
    /// Bind an already verified client to its gateway.
    pub fn new(client: C, gateway: Ipv4Addr) -> NatPmp<C> {
        NatPmp { client, gateway }
    }

    /// Access the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: PmpClient> Nat for NatPmp<C> {
    fn device_address(&self) -> Result<IpAddr> {
        Ok(IpAddr::V4(self.gateway))
    }

    fn internal_address(&self) -> Result<IpAddr> {
        interfaces::internal_address_for(IpAddr::V4(self.gateway))
    }

    fn external_address(&mut self) -> Result<IpAddr> {
        let octets = self.client.external_address()?;
        Ok(IpAddr::V4(Ipv4Addr::from(octets)))
    }

    fn add_port_mapping(
        &mut self,
        protocol: &str,
        internal_port: u16,
        external_port: u16,
        _description: &str,
        timeout: Duration,
    ) -> Result<()> {
        let protocol = PortMappingProtocol::from_name(protocol);
        let lifetime = common::lease_seconds(timeout);
        let mapping = self
            .client
            .add_port_mapping(protocol, internal_port, external_port, lifetime)?;
        if mapping.mapped_external_port != external_port {
            debug!(
                "gateway {} mapped {} port {} to {} instead of {}, releasing it",
                self.gateway, protocol, internal_port, mapping.mapped_external_port, external_port
            );
            let released = self.client.add_port_mapping(protocol, internal_port, 0, 0);
            if let Err(err) = released {
                warn!(
                    "could not release unwanted mapping for port {}: {}",
                    internal_port, err
                );
            }
            return Err(Error::ExternalPortInUse(external_port));
        }
        debug!(
            "gateway {} mapped {} port {} to {} for {}s",
            self.gateway,
            protocol,
            internal_port,
            external_port,
            mapping.lifetime.as_secs()
        );
        Ok(())
    }

    fn delete_port_mapping(
        &mut self,
        protocol: &str,
        internal_port: u16,
        _external_port: u16,
    ) -> Result<()> {
        let protocol = PortMappingProtocol::from_name(protocol);
        self.client.add_port_mapping(protocol, internal_port, 0, 0)?;
        Ok(())
    }

    fn nat_type(&self) -> &str {
        NAT_PMP
    }
}

/// Query `gateway` and publish it if it answers.
///
/// `locate` resolves the gateway address and `connect` builds a client for
/// it. Both run on the discovery thread; any failure means nothing is
/// published.
pub fn discover_with<L, F, C>(locate: L, connect: F) -> Discovery
where
    L: FnOnce() -> Result<Ipv4Addr> + Send + 'static,
    F: FnOnce(Ipv4Addr) -> Result<C> + Send + 'static,
    C: PmpClient + 'static,
{
    Discovery::spawn("natpmp-discovery", move || {
        let gateway = match locate() {
            Ok(gateway) => gateway,
            Err(err) => {
                debug!("no default gateway for NAT-PMP: {}", err);
                return None;
            }
        };
        let mut client = match connect(gateway) {
            Ok(client) => client,
            Err(err) => {
                debug!("could not create NAT-PMP client for {}: {}", gateway, err);
                return None;
            }
        };
        if let Err(err) = client.external_address() {
            debug!("gateway {} does not answer NAT-PMP: {}", gateway, err);
            return None;
        }
        info!("found NAT-PMP gateway at {}", gateway);
        Some(Box::new(NatPmp::new(client, gateway)) as Box<dyn Nat>)
    })
}

/// Discover a NAT-PMP gateway on the default route.
pub fn discover(options: &DiscoveryOptions) -> Discovery {
    let poll_interval = options.pmp_poll_interval;
    discover_with(
        || natpmp::get_default_gateway().map_err(Error::from),
        move |gateway| NatpmpClient::new(gateway, poll_interval),
    )
}
