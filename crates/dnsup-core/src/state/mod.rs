// # Address State
//
// The engine keeps the last applied address snapshot in memory to
// suppress redundant updates. Nothing is persisted: after a restart the
// first observed snapshot is always published.

pub mod cache;

pub use cache::{AddressStateCache, Addresses};
