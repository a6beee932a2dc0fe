//! Core traits for dnsup
//!
//! - [`AddressMonitor`]: Report address changes on the primary interface
//! - [`UpdateTransport`]: Deliver signed updates to a server

pub mod address_monitor;
pub mod update_transport;

pub use address_monitor::{AddressFamily, AddressMonitor, AddressMonitorFactory, snapshot};
pub use update_transport::{Response, UpdateTransport};
