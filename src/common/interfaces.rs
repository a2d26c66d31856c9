use std::net::IpAddr;

use if_addrs::IfAddr;

use crate::errors::{Error, Result};

/// Find the local address whose subnet contains `gateway`.
///
/// Interfaces are scanned in the order the OS reports them and the first
/// match wins.
pub fn internal_address_for(gateway: IpAddr) -> Result<IpAddr> {
    let interfaces = if_addrs::get_if_addrs()?;
    let networks = interfaces.iter().map(|iface| match iface.addr {
        IfAddr::V4(ref v4) => (IpAddr::V4(v4.ip), IpAddr::V4(v4.netmask)),
        IfAddr::V6(ref v6) => (IpAddr::V6(v6.ip), IpAddr::V6(v6.netmask)),
    });
    internal_address_among(gateway, networks)
}

/// Like [`find_in_networks`], failing with `NoInternalAddress` on no match.
pub fn internal_address_among<I>(gateway: IpAddr, networks: I) -> Result<IpAddr>
where
    I: IntoIterator<Item = (IpAddr, IpAddr)>,
{
    find_in_networks(gateway, networks).ok_or(Error::NoInternalAddress)
}

/// First `(ip, netmask)` pair whose network contains `target`.
pub fn find_in_networks<I>(target: IpAddr, networks: I) -> Option<IpAddr>
where
    I: IntoIterator<Item = (IpAddr, IpAddr)>,
{
    networks
        .into_iter()
        .find(|&(ip, netmask)| subnet_contains(ip, netmask, target))
        .map(|(ip, _)| ip)
}

/// Whether `target` lies in the network of `ip`/`netmask`.
///
/// Addresses of different families never match.
pub fn subnet_contains(ip: IpAddr, netmask: IpAddr, target: IpAddr) -> bool {
    match (ip, netmask, target) {
        (IpAddr::V4(ip), IpAddr::V4(mask), IpAddr::V4(target)) => {
            let mask = u32::from(mask);
            u32::from(ip) & mask == u32::from(target) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(mask), IpAddr::V6(target)) => {
            let mask = u128::from(mask);
            u128::from(ip) & mask == u128::from(target) & mask
        }
        _ => false,
    }
}
