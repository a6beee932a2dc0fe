// # Update Transports
//
// Implementations of the UpdateTransport trait.

pub mod udp;

pub use udp::UdpTransport;
