// # Address Monitor Trait
//
// Defines the interface to the platform mechanism that reports address
// changes on the host's primary interface.
//
// ## Implementations
//
// - Netlink-based (Linux): `dnsup-netlink` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsup_core::traits::{AddressMonitor, snapshot};
// use tokio_stream::StreamExt;
//
// let monitor = /* AddressMonitor implementation */;
// let mut changes = monitor.watch();
// while changes.next().await.is_some() {
//     if let Some((v4, v6)) = snapshot(&monitor).await {
//         println!("addresses now {:?} {:?}", v4, v6);
//     }
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Address family of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for address monitor implementations
///
/// The monitor only observes. It does not filter addresses, decide whether
/// an update is needed, or talk to DNS servers.
///
/// "Nothing there" is an empty result, never an error: no primary
/// interface yields `None`, a family without addresses yields an empty
/// list.
#[async_trait]
pub trait AddressMonitor: Send + Sync {
    /// Stream with one item per change notification
    ///
    /// Items carry no data; consumers re-query the current state. The
    /// stream ends when the monitor shuts down.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = ()> + Send + 'static>>;

    /// Name of the interface carrying the default route
    async fn primary_interface(&self) -> Option<String>;

    /// Addresses of one family configured on `interface`, as text
    async fn addresses(&self, interface: &str, family: AddressFamily) -> Vec<String>;
}

/// Query the primary interface's addresses
///
/// Returns `None` when there is no primary interface or when both
/// families are empty; such a cycle is skipped.
pub async fn snapshot<M: AddressMonitor + ?Sized>(monitor: &M) -> Option<(Vec<String>, Vec<String>)> {
    let Some(interface) = monitor.primary_interface().await else {
        warn!("No primary interface");
        return None;
    };

    let v4 = monitor.addresses(&interface, AddressFamily::V4).await;
    let v6 = monitor.addresses(&interface, AddressFamily::V6).await;

    if v4.is_empty() && v6.is_empty() {
        debug!("No addresses on {}", interface);
        return None;
    }

    Some((v4, v6))
}

/// Helper trait for constructing address monitors
pub trait AddressMonitorFactory: Send + Sync {
    /// Create an AddressMonitor instance
    fn create(&self) -> Result<Box<dyn AddressMonitor>, crate::Error>;
}
