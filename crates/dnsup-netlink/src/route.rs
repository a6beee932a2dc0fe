// # Route, Link and Address Selection
//
// Pure functions over decoded rtnetlink dumps. The primary interface is the
// one carrying the unicast default route of the main table with the lowest
// priority; IPv4 is consulted first, IPv6 when there is no IPv4 default.

use dnsup_core::traits::AddressFamily;
use netlink_packet_route::nlas::address::Nla as AddressNla;
use netlink_packet_route::nlas::link::Nla as LinkNla;
use netlink_packet_route::nlas::route::Nla as RouteNla;
use netlink_packet_route::{
    AddressMessage, LinkMessage, RT_SCOPE_LINK, RT_TABLE_MAIN, RTN_UNICAST, RouteMessage,
};
use std::net::{Ipv4Addr, Ipv6Addr};

/// `AF_INET`/`AF_INET6` as carried in rtnetlink headers
pub fn family_byte(family: AddressFamily) -> u8 {
    match family {
        AddressFamily::V4 => libc::AF_INET as u8,
        AddressFamily::V6 => libc::AF_INET6 as u8,
    }
}

/// Output interface index of the best default route
pub fn default_route_oif(routes: &[RouteMessage]) -> Option<u32> {
    routes
        .iter()
        .filter(|route| {
            route.header.destination_prefix_length == 0
                && route.header.kind == RTN_UNICAST
                && route_table(route) == u32::from(RT_TABLE_MAIN)
        })
        .filter_map(|route| {
            let mut oif = None;
            let mut priority = 0;
            for nla in &route.nlas {
                match nla {
                    RouteNla::Oif(index) => oif = Some(*index),
                    RouteNla::Priority(p) => priority = *p,
                    _ => {}
                }
            }
            oif.map(|index| (priority, index))
        })
        .min_by_key(|(priority, _)| *priority)
        .map(|(_, index)| index)
}

/// Table id; the attribute wins over the 8-bit header field
fn route_table(route: &RouteMessage) -> u32 {
    route
        .nlas
        .iter()
        .find_map(|nla| match nla {
            RouteNla::Table(table) => Some(*table),
            _ => None,
        })
        .unwrap_or_else(|| u32::from(route.header.table))
}

/// Name of the link with `index`
pub fn link_name(links: &[LinkMessage], index: u32) -> Option<String> {
    links
        .iter()
        .find(|link| link.header.index == index)
        .and_then(|link| {
            link.nlas.iter().find_map(|nla| match nla {
                LinkNla::IfName(name) => Some(name.clone()),
                _ => None,
            })
        })
}

/// Index of the link called `name`
pub fn link_index(links: &[LinkMessage], name: &str) -> Option<u32> {
    links
        .iter()
        .find(|link| {
            link.nlas
                .iter()
                .any(|nla| matches!(nla, LinkNla::IfName(n) if n == name))
        })
        .map(|link| link.header.index)
}

/// Addresses of one family on the link `index`, as text
///
/// Link-scoped IPv6 addresses carry a `%interface` suffix.
pub fn interface_addresses(
    addresses: &[AddressMessage],
    index: u32,
    interface: &str,
    family: AddressFamily,
) -> Vec<String> {
    addresses
        .iter()
        .filter(|msg| msg.header.index == index && msg.header.family == family_byte(family))
        .filter_map(|msg| {
            let bytes = address_bytes(msg, family)?;
            match family {
                AddressFamily::V4 => {
                    let octets: [u8; 4] = bytes.try_into().ok()?;
                    Some(Ipv4Addr::from(octets).to_string())
                }
                AddressFamily::V6 => {
                    let octets: [u8; 16] = bytes.try_into().ok()?;
                    let addr = Ipv6Addr::from(octets);
                    if msg.header.scope == RT_SCOPE_LINK {
                        Some(format!("{}%{}", addr, interface))
                    } else {
                        Some(addr.to_string())
                    }
                }
            }
        })
        .collect()
}

/// IFA_LOCAL is the host's own IPv4 address (IFA_ADDRESS is the peer on
/// point-to-point links); IPv6 reports it in IFA_ADDRESS.
fn address_bytes(msg: &AddressMessage, family: AddressFamily) -> Option<&[u8]> {
    let local = msg.nlas.iter().find_map(|nla| match nla {
        AddressNla::Local(bytes) => Some(bytes.as_slice()),
        _ => None,
    });
    let address = msg.nlas.iter().find_map(|nla| match nla {
        AddressNla::Address(bytes) => Some(bytes.as_slice()),
        _ => None,
    });

    match family {
        AddressFamily::V4 => local.or(address),
        AddressFamily::V6 => address.or(local),
    }
}
