//! Error types for dnsup
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnsup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dnsup
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Address monitor errors
    #[error("Address monitor error: {0}")]
    Monitor(String),

    /// A message could not be encoded on the wire
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// No response arrived within the transport timeout
    #[error("No response from {server} within {timeout:?}")]
    Timeout {
        /// Server the update was sent to
        server: String,
        /// Timeout that expired
        timeout: std::time::Duration,
    },

    /// Socket and resolution errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// The server answered with a non-zero response code
    #[error("Server {server} rejected update: {rcode}")]
    ServerRejected {
        /// Server that answered
        server: String,
        /// Response code mnemonic (e.g. NOTAUTH)
        rcode: String,
    },

    /// TSIG signing or verification failure
    #[error("TSIG error: {0}")]
    Tsig(String),

    /// A response could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an address monitor error
    pub fn monitor(msg: impl Into<String>) -> Self {
        Self::Monitor(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a TSIG error
    pub fn tsig(msg: impl Into<String>) -> Self {
        Self::Tsig(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a server rejection error
    pub fn rejected(server: impl Into<String>, rcode: impl Into<String>) -> Self {
        Self::ServerRejected {
            server: server.into(),
            rcode: rcode.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
