// # Update Transport Trait
//
// Defines the interface for delivering a signed UPDATE to a server.
//
// ## Implementations
//
// - UDP: [`crate::transport::UdpTransport`]

use crate::tsig::SignedMessage;
use crate::wire::Rcode;
use async_trait::async_trait;

/// A server's answer to an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response code (NOERROR for an accepted update)
    pub rcode: Rcode,
    /// The raw response, for signature verification
    pub bytes: Vec<u8>,
}

/// Trait for update transports
///
/// # Single-shot
///
/// Exactly one attempt per call: no retries and no backoff. A timeout, a
/// socket error and an error response code are all returned as `Err`;
/// the engine treats them alike.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    /// Send `message` to `server` and wait for the matching response
    async fn send(&self, message: &SignedMessage, server: &str) -> Result<Response, crate::Error>;

    /// Transport name (for logging)
    fn transport_name(&self) -> &'static str;
}
