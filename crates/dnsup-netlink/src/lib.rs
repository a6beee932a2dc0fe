// # Netlink Address Monitor
//
// This crate provides a Netlink-based address monitor for Linux systems.
//
// ## How it works
//
// 1. A NETLINK_ROUTE socket (`netlink_sys::TokioSocket`) subscribes to the
//    link, IPv4/IPv6 address and IPv4/IPv6 route multicast groups
// 2. A reader task turns received datagrams into notifications; a burst of
//    messages (an interface bounce) collapses into one pending item
// 3. On each notification the engine re-queries the primary interface
//    (RTM_GETROUTE + RTM_GETLINK dumps) and its addresses (RTM_GETADDR),
//    decoded with `netlink-packet-route`
//
// ## Platform Support
//
// Netlink is Linux-only. On other platforms the factory fails with a
// configuration error.

#[cfg(target_os = "linux")]
mod dump;
#[cfg(target_os = "linux")]
pub mod route;

use dnsup_core::Result;
use dnsup_core::traits::{AddressMonitor, AddressMonitorFactory};

#[cfg(not(target_os = "linux"))]
use dnsup_core::Error;

#[cfg(target_os = "linux")]
pub use linux::NetlinkAddressMonitor;

#[cfg(target_os = "linux")]
mod linux {
    use super::{dump, route};
    use dnsup_core::traits::{AddressFamily, AddressMonitor};
    use dnsup_core::{Error, Result};
    use netlink_sys::{AsyncSocket, AsyncSocketExt, SocketAddr, TokioSocket, protocols::NETLINK_ROUTE};
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::error::TrySendError;
    use tokio_stream::Stream;
    use tokio_stream::wrappers::ReceiverStream;
    use tracing::{debug, error, warn};

    /// Multicast groups that signal a possible address change
    const GROUPS: u32 = (libc::RTMGRP_LINK
        | libc::RTMGRP_IPV4_IFADDR
        | libc::RTMGRP_IPV6_IFADDR
        | libc::RTMGRP_IPV4_ROUTE
        | libc::RTMGRP_IPV6_ROUTE) as u32;

    /// Netlink-based address monitor for Linux
    pub struct NetlinkAddressMonitor {
        /// Subscribed socket, handed to the reader task by `watch()`
        socket: Mutex<Option<TokioSocket>>,
    }

    impl NetlinkAddressMonitor {
        /// Open and subscribe the netlink socket
        ///
        /// Must be called inside a tokio runtime.
        pub fn new() -> Result<Self> {
            let mut socket = TokioSocket::new(NETLINK_ROUTE)
                .map_err(|e| Error::monitor(format!("Failed to open netlink socket: {}", e)))?;
            socket
                .socket_mut()
                .bind(&SocketAddr::new(0, GROUPS))
                .map_err(|e| {
                    Error::monitor(format!("Failed to subscribe to netlink groups: {}", e))
                })?;

            debug!("Netlink socket subscribed to groups {:#x}", GROUPS);

            Ok(Self {
                socket: Mutex::new(Some(socket)),
            })
        }
    }

    /// Queue one notification unless one is already pending
    ///
    /// Returns false once the receiver is gone.
    fn notify(tx: &mpsc::Sender<()>) -> bool {
        match tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }

    async fn read_notifications(socket: TokioSocket, tx: mpsc::Sender<()>) {
        loop {
            tokio::select! {
                _ = tx.closed() => break,

                received = socket.recv_from_full() => match received {
                    Ok((datagram, _)) => {
                        debug!("Netlink notification ({} bytes)", datagram.len());
                        if !notify(&tx) {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    // Kernel dropped messages; the state changed anyway
                    Err(e) if e.raw_os_error() == Some(libc::ENOBUFS) => {
                        warn!("Netlink receive buffer overrun");
                        if !notify(&tx) {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Netlink socket error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    #[async_trait::async_trait]
    impl AddressMonitor for NetlinkAddressMonitor {
        fn watch(&self) -> Pin<Box<dyn Stream<Item = ()> + Send + 'static>> {
            let (tx, rx) = mpsc::channel(1);

            let socket = match self.socket.lock() {
                Ok(mut guard) => guard.take(),
                Err(_) => None,
            };

            match socket {
                Some(socket) => {
                    tokio::spawn(read_notifications(socket, tx));
                }
                None => {
                    warn!("watch() called twice on the netlink monitor; returning an ended stream");
                    drop(tx);
                }
            }

            Box::pin(ReceiverStream::new(rx))
        }

        async fn primary_interface(&self) -> Option<String> {
            let mut oif = None;
            for family in [AddressFamily::V4, AddressFamily::V6] {
                match dump::routes(route::family_byte(family)).await {
                    Ok(routes) => oif = route::default_route_oif(&routes),
                    Err(e) => warn!("Failed to dump {} routes: {}", family, e),
                }
                if oif.is_some() {
                    break;
                }
            }
            let index = oif?;

            match dump::links().await {
                Ok(links) => route::link_name(&links, index),
                Err(e) => {
                    warn!("Failed to dump links: {}", e);
                    None
                }
            }
        }

        async fn addresses(&self, interface: &str, family: AddressFamily) -> Vec<String> {
            match interface_addresses(interface, family).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    warn!("Failed to list {} addresses of {}: {}", family, interface, e);
                    Vec::new()
                }
            }
        }
    }

    async fn interface_addresses(interface: &str, family: AddressFamily) -> io::Result<Vec<String>> {
        let links = dump::links().await?;
        let Some(index) = route::link_index(&links, interface) else {
            return Ok(Vec::new());
        };

        let addrs = dump::addresses(route::family_byte(family)).await?;
        Ok(route::interface_addresses(&addrs, index, interface, family))
    }

}

/// Factory for creating Netlink address monitors
pub struct NetlinkFactory;

#[cfg(target_os = "linux")]
impl AddressMonitorFactory for NetlinkFactory {
    fn create(&self) -> Result<Box<dyn AddressMonitor>> {
        Ok(Box::new(NetlinkAddressMonitor::new()?))
    }
}

#[cfg(not(target_os = "linux"))]
impl AddressMonitorFactory for NetlinkFactory {
    fn create(&self) -> Result<Box<dyn AddressMonitor>> {
        Err(Error::config(
            "Netlink address monitor is only supported on Linux",
        ))
    }
}
