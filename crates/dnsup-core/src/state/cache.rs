// # Address State Cache
//
// Holds the last snapshot the engine committed to.
//
// ## Lifecycle
//
// - Empty at process start
// - Committed optimistically, before any update is sent
// - Invalidated when any record's update fails, so the next notification
//   is applied even if the addresses did not change
//
// There is no retry timer. If the network never changes again after a
// failure, the failed update is not retried.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Addresses of the primary interface, per family, in observed order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addresses {
    pub v4: Vec<Ipv4Addr>,
    /// Publishable IPv6 addresses (already filtered)
    pub v6: Vec<Ipv6Addr>,
}

impl Addresses {
    pub fn new(v4: Vec<Ipv4Addr>, v6: Vec<Ipv6Addr>) -> Self {
        Self { v4, v6 }
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

impl fmt::Display for Addresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v4={:?} v6={:?}", self.v4, self.v6)
    }
}

/// Last committed address snapshot
///
/// Owned by the engine and only mutated from its event path, so no locking
/// is involved.
#[derive(Debug, Default)]
pub struct AddressStateCache {
    cached: Option<Addresses>,
}

impl AddressStateCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// True unless `addrs` equals the committed snapshot exactly
    ///
    /// Always true on an empty or invalidated cache.
    pub fn has_changed(&self, addrs: &Addresses) -> bool {
        self.cached.as_ref() != Some(addrs)
    }

    /// Replace the committed snapshot
    pub fn commit(&mut self, addrs: Addresses) {
        self.cached = Some(addrs);
    }

    /// Forget the committed snapshot
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// The committed snapshot, if any
    pub fn current(&self) -> Option<&Addresses> {
        self.cached.as_ref()
    }
}
