//! Host network helpers.

use std::net::{IpAddr, Ipv4Addr};

/// First non-loopback IPv4 address of the host, or loopback when none is
/// available.
pub fn local_ip() -> IpAddr {
    if_addrs::get_if_addrs()
        .ok()
        .and_then(|interfaces| {
            interfaces
                .into_iter()
                .filter(|iface| !iface.is_loopback())
                .find_map(|iface| match iface.addr {
                    if_addrs::IfAddr::V4(addr) => Some(IpAddr::V4(addr.ip)),
                    _ => None,
                })
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
