// # UDP Transport
//
// Sends one signed UPDATE per call over UDP and waits, bounded by the
// configured timeout, for the response with the same id.
//
// ## Failure Kinds
//
// - Name resolution or socket error → `Error::Network`
// - No matching response in time → `Error::Timeout`
// - Non-zero response code → `Error::ServerRejected`
//
// The engine handles all three the same way. This transport never retries.

use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::traits::{Response, UpdateTransport};
use crate::tsig::SignedMessage;
use crate::wire::{ResponseHeader, find_tsig};

/// Largest datagram accepted as a response
const MAX_DATAGRAM: usize = 65_535;

/// UDP update transport
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
    port: u16,
}

impl UdpTransport {
    pub fn new(timeout: Duration, port: u16) -> Self {
        Self { timeout, port }
    }

    /// Create a transport from engine settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), config.port)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn resolve(&self, server: &str) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host((server, self.port)).await?;
        addrs.next().ok_or_else(|| {
            Error::Network(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} has no addresses", server),
            ))
        })
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[async_trait]
impl UpdateTransport for UdpTransport {
    async fn send(&self, message: &SignedMessage, server: &str) -> Result<Response> {
        let target = self.resolve(server).await?;

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;

        debug!(
            "Sending update {:#06x} ({} bytes) to {} ({})",
            message.id,
            message.bytes.len(),
            server,
            target
        );
        socket.send(&message.bytes).await?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let len = match tokio::time::timeout_at(deadline, socket.recv(&mut buf)).await {
                Ok(received) => received?,
                Err(_) => {
                    return Err(Error::Timeout {
                        server: server.to_string(),
                        timeout: self.timeout,
                    });
                }
            };
            let bytes = &buf[..len];

            let header = match ResponseHeader::parse(bytes) {
                Ok(header) => header,
                Err(e) => {
                    warn!("Ignoring unparsable datagram from {}: {}", target, e);
                    continue;
                }
            };

            if !header.is_response || header.id != message.id {
                debug!(
                    "Ignoring datagram {:#06x} from {} while waiting for {:#06x}",
                    header.id, target, message.id
                );
                continue;
            }

            if header.rcode.is_error() {
                // BADSIG, BADKEY and BADTIME arrive as NOTAUTH plus a TSIG
                // error field.
                let rcode = match find_tsig(bytes) {
                    Ok(Some(tsig)) if tsig.error.is_error() => {
                        format!("{} ({})", header.rcode, tsig.error)
                    }
                    _ => header.rcode.name(),
                };
                return Err(Error::rejected(server, rcode));
            }

            return Ok(Response {
                rcode: header.rcode,
                bytes: bytes.to_vec(),
            });
        }
    }

    fn transport_name(&self) -> &'static str {
        "udp"
    }
}
