use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default SSDP multicast address and port.
pub const SSDP_BROADCAST_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(239, 255, 255, 250)), 1900);

/// `nat_type()` label of instances found by UPnP discovery.
pub const DEFAULT_UPNP_LABEL: &str = "UPNP";

/// Options controlling gateway discovery.
#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    /// Bind address for the SSDP socket.
    pub bind_addr: SocketAddr,
    /// Multicast address the SSDP search is sent to.
    pub broadcast_address: SocketAddr,
    /// Timeout of the SSDP search. `None` waits for the first answer.
    pub timeout: Option<Duration>,
    /// Label returned by `nat_type()` for UPnP instances.
    pub upnp_label: String,
    /// Sleep between polls while the NAT-PMP client waits for an answer.
    pub pmp_poll_interval: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            broadcast_address: SSDP_BROADCAST_ADDRESS,
            timeout: Some(Duration::from_secs(10)),
            upnp_label: DEFAULT_UPNP_LABEL.to_string(),
            pmp_poll_interval: Duration::from_millis(100),
        }
    }
}

impl DiscoveryOptions {
    pub(crate) fn search_options(&self) -> igd::SearchOptions {
        igd::SearchOptions {
            bind_addr: self.bind_addr,
            broadcast_address: self.broadcast_address,
            timeout: self.timeout,
            ..Default::default()
        }
    }
}
