//! Address publication policy
//!
//! Only globally routable IPv6 addresses are published. IPv4 addresses pass
//! through as observed.

use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

/// Decides which observed addresses may be published
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressFilter;

impl AddressFilter {
    pub fn new() -> Self {
        Self
    }

    /// Whether an IPv6 address is globally routable
    ///
    /// Rejected: link-local `fe80::/10`, unique-local `fc00::/7`, site-local
    /// `fec0::/10`, loopback, unspecified and multicast.
    pub fn is_publishable(&self, addr: &Ipv6Addr) -> bool {
        let first = addr.segments()[0];

        let link_local = first & 0xffc0 == 0xfe80;
        let site_local = first & 0xffc0 == 0xfec0;
        let unique_local = first & 0xfe00 == 0xfc00;

        !(link_local
            || site_local
            || unique_local
            || addr.is_loopback()
            || addr.is_unspecified()
            || addr.is_multicast())
    }

    /// Keep the publishable addresses, preserving order
    pub fn filter(&self, addrs: &[Ipv6Addr]) -> Vec<Ipv6Addr> {
        addrs
            .iter()
            .filter(|addr| {
                let keep = self.is_publishable(addr);
                if !keep {
                    debug!("Not publishing non-global address {}", addr);
                }
                keep
            })
            .copied()
            .collect()
    }
}

/// Parse the IPv4 strings reported by a monitor
///
/// Entries that are not IPv4 addresses are dropped with a warning.
pub fn parse_v4<S: AsRef<str>>(raw: &[S]) -> Vec<Ipv4Addr> {
    raw.iter()
        .filter_map(|s| {
            let s = s.as_ref().trim();
            match s.parse::<Ipv4Addr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    warn!("Ignoring invalid IPv4 address '{}'", s);
                    None
                }
            }
        })
        .collect()
}

/// Parse the IPv6 strings reported by a monitor
///
/// A zone suffix (`fe80::1%en0`) is stripped. Entries that are not IPv6
/// addresses are dropped with a warning.
pub fn parse_v6<S: AsRef<str>>(raw: &[S]) -> Vec<Ipv6Addr> {
    raw.iter()
        .filter_map(|s| {
            let s = s.as_ref().trim();
            let bare = s.split('%').next().unwrap_or(s);
            match bare.parse::<Ipv6Addr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    warn!("Ignoring invalid IPv6 address '{}'", s);
                    None
                }
            }
        })
        .collect()
}
