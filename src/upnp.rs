//! UPnP IGD backend.

use std::net::{IpAddr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use crate::common::{self, DiscoveryOptions};
use crate::discovery::Discovery;
use crate::errors::{Error, Result};
use crate::nat::{Nat, PortMappingProtocol};

/// The UPnP IGD control calls the backend relies on.
///
/// Addresses travel as text, the way the device reports them.
pub trait IgdClient: Send {
    /// Host of the gateway's control URL.
    fn gateway_host(&self) -> String;

    /// Local address this host used to reach the gateway.
    fn local_host(&self) -> String;

    /// Ask the gateway for its external address.
    fn external_ip(&mut self) -> Result<String>;

    /// Map `external_port` to `internal_port` on the local host.
    fn add_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        internal_port: u16,
        external_port: u16,
        lease_duration: u32,
        description: &str,
    ) -> Result<()>;

    /// Remove the mapping of `external_port`.
    fn delete_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        external_port: u16,
    ) -> Result<()>;
}

/// An [`igd::Gateway`] and the local address it was reached from.
#[derive(Debug)]
pub struct IgdGateway {
    gateway: igd::Gateway,
    local_addr: SocketAddrV4,
}

impl IgdGateway {
    /// Search the local network for a gateway.
    pub fn search(options: &DiscoveryOptions) -> Result<IgdGateway> {
        let gateway = igd::search_gateway(options.search_options())?;
        debug!("UPnP gateway responded from {}", gateway.addr);
        let local_addr = local_addr_towards(gateway.addr)?;
        Ok(IgdGateway {
            gateway,
            local_addr,
        })
    }
}

// Connecting a UDP socket only selects a route, no packet is sent.
fn local_addr_towards(gateway: SocketAddrV4) -> Result<SocketAddrV4> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
    socket.connect(gateway)?;
    match socket.local_addr()? {
        SocketAddr::V4(addr) => Ok(addr),
        SocketAddr::V6(_) => Err(Error::NoInternalAddress),
    }
}

impl IgdClient for IgdGateway {
    fn gateway_host(&self) -> String {
        self.gateway.addr.ip().to_string()
    }

    fn local_host(&self) -> String {
        self.local_addr.ip().to_string()
    }

    fn external_ip(&mut self) -> Result<String> {
        let ip = self.gateway.get_external_ip()?;
        Ok(ip.to_string())
    }

    fn add_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        internal_port: u16,
        external_port: u16,
        lease_duration: u32,
        description: &str,
    ) -> Result<()> {
        let local_addr = SocketAddrV4::new(*self.local_addr.ip(), internal_port);
        self.gateway.add_port(
            wire_protocol(protocol),
            external_port,
            local_addr,
            lease_duration,
            description,
        )?;
        Ok(())
    }

    fn delete_port_mapping(
        &mut self,
        protocol: PortMappingProtocol,
        external_port: u16,
    ) -> Result<()> {
        let protocol = wire_protocol(protocol);
        self.gateway.remove_port(protocol, external_port)?;
        Ok(())
    }
}

fn wire_protocol(protocol: PortMappingProtocol) -> igd::PortMappingProtocol {
    match protocol {
        PortMappingProtocol::TCP => igd::PortMappingProtocol::TCP,
        PortMappingProtocol::UDP => igd::PortMappingProtocol::UDP,
    }
}

/// A gateway reached over UPnP IGD.
pub struct Upnp<C> {
    client: C,
    label: String,
}

impl<C: IgdClient> Upnp<C> {
    /// Wrap a client found by discovery, reporting `label` as its type.
    pub fn new(client: C, label: &str) -> Upnp<C> {
        Upnp {
            client,
            label: label.to_string(),
        }
    }

    /// Access the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: IgdClient> Nat for Upnp<C> {
    fn device_address(&self) -> Result<IpAddr> {
        self.client
            .gateway_host()
            .parse()
            .map_err(|_| Error::NoInternalAddress)
    }

    fn internal_address(&self) -> Result<IpAddr> {
        self.client
            .local_host()
            .parse()
            .map_err(|_| Error::NoInternalAddress)
    }

    fn external_address(&mut self) -> Result<IpAddr> {
        let text = self.client.external_ip()?;
        text.trim().parse().map_err(|_| Error::NoExternalAddress)
    }

    fn add_port_mapping(
        &mut self,
        protocol: &str,
        internal_port: u16,
        external_port: u16,
        description: &str,
        timeout: Duration,
    ) -> Result<()> {
        let protocol = PortMappingProtocol::from_name(protocol);
        self.client.add_port_mapping(
            protocol,
            internal_port,
            external_port,
            common::lease_seconds(timeout),
            description,
        )
    }

    // Errors from the device are not reported: deleting is best-effort.
    fn delete_port_mapping(
        &mut self,
        protocol: &str,
        _internal_port: u16,
        external_port: u16,
    ) -> Result<()> {
        let protocol = PortMappingProtocol::from_name(protocol);
        if let Err(err) = self.client.delete_port_mapping(protocol, external_port) {
            debug!(
                "ignoring UPnP error removing {} port {}: {}",
                protocol, external_port, err
            );
        }
        Ok(())
    }

    fn nat_type(&self) -> &str {
        &self.label
    }
}

/// Run `search` on the discovery thread and publish what it finds as `label`.
pub fn discover_with<S, C>(search: S, label: &str) -> Discovery
where
    S: FnOnce() -> Result<C> + Send + 'static,
    C: IgdClient + 'static,
{
    let label = label.to_string();
    Discovery::spawn("upnp-discovery", move || match search() {
        Ok(client) => {
            info!("found UPnP gateway at {}", client.gateway_host());
            Some(Box::new(Upnp::new(client, &label)) as Box<dyn Nat>)
        }
        Err(err) => {
            debug!("no UPnP gateway: {}", err);
            None
        }
    })
}

/// Discover a UPnP IGD with an SSDP search.
pub fn discover(options: &DiscoveryOptions) -> Discovery {
    let search_options = options.clone();
    let search = move || IgdGateway::search(&search_options);
    discover_with(search, &options.upnp_label)
}
