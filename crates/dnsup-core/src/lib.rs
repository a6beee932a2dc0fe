// # dnsup-core
//
// Core library for change-triggered RFC 2136 dynamic DNS updates.
//
// ## Architecture Overview
//
// This library provides the core functionality for signed DNS updates:
// - **AddressMonitor**: Trait for observing address changes on the primary interface
// - **AddressFilter**: Policy deciding which IPv6 addresses may be published
// - **AddressStateCache**: Last published snapshot, for change detection
// - **UpdateMessageBuilder**: Builds the RFC 2136 UPDATE for one record
// - **TsigSigner**: HMAC-SHA256 TSIG signing and response verification
// - **UpdateTransport**: Trait for delivering signed updates (UDP provided)
// - **UpdateOrchestrator**: Ties the above together, one snapshot at a time
//
// ## Design Principles
//
// 1. **Event-Driven**: Nothing is sent without an address notification
// 2. **Idempotency**: An unchanged snapshot produces no network traffic
// 3. **Retry by Invalidation**: A failed update clears the cache; the next
//    notification resends everything
// 4. **Library-First**: All core functionality can be used as a library

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod state;
pub mod traits;
pub mod transport;
pub mod tsig;
pub mod wire;

// Re-export core types for convenience
pub use builder::UpdateMessageBuilder;
pub use config::{DnsupConfig, EngineConfig, RecordConfig};
pub use engine::{EngineEvent, UpdateOrchestrator, UpdateOutcome};
pub use error::{Error, Result};
pub use filter::AddressFilter;
pub use state::{AddressStateCache, Addresses};
pub use traits::{AddressMonitor, UpdateTransport};
pub use transport::UdpTransport;
pub use tsig::{SignedMessage, TsigSigner};
