//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that verify engine behavior
//! without touching real interfaces or DNS servers.

#![allow(dead_code)]

use dnsup_core::config::{DnsupConfig, RecordConfig};
use dnsup_core::error::{Error, Result};
use dnsup_core::traits::{AddressFamily, AddressMonitor, Response, UpdateTransport};
use dnsup_core::tsig::SignedMessage;
use dnsup_core::wire::{Rcode, ResponseHeader, WireReader};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// Shared TSIG secret of every test record
pub const SECRET: &[u8] = b"dnsup-test-secret-0123456789abcd";

#[derive(Default)]
struct MonitorState {
    interface: Option<String>,
    v4: Vec<String>,
    v6: Vec<String>,
}

/// An AddressMonitor whose addresses and notifications are driven by the test
pub struct ControlledAddressMonitor {
    state: Arc<Mutex<MonitorState>>,
    /// Receiver for the engine's watch stream
    engine_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<()>>>>,
    /// Call counter for addresses()
    query_count: Arc<AtomicUsize>,
}

/// Test-side handle of a ControlledAddressMonitor
#[derive(Clone)]
pub struct MonitorHandle {
    state: Arc<Mutex<MonitorState>>,
    test_tx: mpsc::UnboundedSender<()>,
    query_count: Arc<AtomicUsize>,
}

impl ControlledAddressMonitor {
    /// Create a monitor reporting `v4` and `v6` on `eth0`
    pub fn new(v4: &[&str], v6: &[&str]) -> (Self, MonitorHandle) {
        let (test_tx, engine_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(MonitorState {
            interface: Some("eth0".to_string()),
            v4: v4.iter().map(|s| s.to_string()).collect(),
            v6: v6.iter().map(|s| s.to_string()).collect(),
        }));
        let query_count = Arc::new(AtomicUsize::new(0));

        let monitor = Self {
            state: Arc::clone(&state),
            engine_rx: Arc::new(Mutex::new(Some(engine_rx))),
            query_count: Arc::clone(&query_count),
        };
        let handle = MonitorHandle {
            state,
            test_tx,
            query_count,
        };

        (monitor, handle)
    }
}

impl MonitorHandle {
    /// Replace the reported addresses (does not notify)
    pub fn set_addresses(&self, v4: &[&str], v6: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.v4 = v4.iter().map(|s| s.to_string()).collect();
        state.v6 = v6.iter().map(|s| s.to_string()).collect();
    }

    /// Drop or restore the primary interface
    pub fn set_interface(&self, interface: Option<&str>) {
        self.state.lock().unwrap().interface = interface.map(str::to_string);
    }

    /// Deliver one change notification
    pub fn notify(&self) {
        let _ = self.test_tx.send(());
    }

    /// Number of addresses() calls so far
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressMonitor for ControlledAddressMonitor {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = ()> + Send + 'static>> {
        // Take the receiver (only called once)
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");

        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    async fn primary_interface(&self) -> Option<String> {
        self.state.lock().unwrap().interface.clone()
    }

    async fn addresses(&self, _interface: &str, family: AddressFamily) -> Vec<String> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        match family {
            AddressFamily::V4 => state.v4.clone(),
            AddressFamily::V6 => state.v6.clone(),
        }
    }
}

/// How a MockTransport answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// NOERROR, signed with SECRET
    Accept,
    /// NOERROR without a TSIG record
    Unsigned,
    /// Timeout error for every call
    Timeout,
}

/// A mock UpdateTransport that records every message it is given
pub struct MockTransport {
    /// Call counter for send()
    send_count: Arc<AtomicUsize>,
    /// Messages passed to send(), with their server
    sent: Arc<Mutex<Vec<(String, SignedMessage)>>>,
    /// Calls still to be failed before `mode` applies
    fail_remaining: Arc<AtomicUsize>,
    mode: ReplyMode,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_mode(ReplyMode::Accept)
    }

    pub fn with_mode(mode: ReplyMode) -> Self {
        Self {
            send_count: Arc::new(AtomicUsize::new(0)),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_remaining: Arc::new(AtomicUsize::new(0)),
            mode,
        }
    }

    /// Time out on the first `n` calls, then behave normally
    pub fn failing_first(n: usize) -> Self {
        let transport = Self::new();
        transport.fail_remaining.store(n, Ordering::SeqCst);
        transport
    }

    /// Create a new MockTransport that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            send_count: Arc::clone(&other.send_count),
            sent: Arc::clone(&other.sent),
            fail_remaining: Arc::clone(&other.fail_remaining),
            mode: other.mode,
        }
    }

    /// Get the number of times send() was called
    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Messages sent so far, with the server they were sent to
    pub fn sent(&self) -> Vec<(String, SignedMessage)> {
        self.sent.lock().unwrap().clone()
    }

    fn timeout(server: &str) -> Error {
        Error::Timeout {
            server: server.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait::async_trait]
impl UpdateTransport for MockTransport {
    async fn send(&self, message: &SignedMessage, server: &str) -> Result<Response> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((server.to_string(), message.clone()));

        let failing = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Self::timeout(server));
        }

        match self.mode {
            ReplyMode::Accept => Ok(Response {
                rcode: Rcode::NOERROR,
                bytes: signed_reply(message, SECRET),
            }),
            ReplyMode::Unsigned => Ok(Response {
                rcode: Rcode::NOERROR,
                bytes: reply_header(message.id),
            }),
            ReplyMode::Timeout => Err(Self::timeout(server)),
        }
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

/// Bare NOERROR update response header
pub fn reply_header(id: u16) -> Vec<u8> {
    let mut bytes = id.to_be_bytes().to_vec();
    bytes.extend_from_slice(&[0xA8, 0x00, 0, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}

/// A NOERROR response signed the way a server signs it
pub fn signed_reply(request: &SignedMessage, secret: &[u8]) -> Vec<u8> {
    const ALGORITHM: &[u8] = b"\x0bhmac-sha256\x00";
    let time = request.time_signed + 1;
    let response = reply_header(request.id);

    let mut key_name = Vec::new();
    request.key_name.compose_canonical(&mut key_name);

    let mut hmac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    hmac.update(&(request.mac.len() as u16).to_be_bytes());
    hmac.update(&request.mac);
    hmac.update(&response);
    hmac.update(&key_name);
    hmac.update(&[0, 255, 0, 0, 0, 0]);
    hmac.update(ALGORITHM);
    hmac.update(&time.to_be_bytes()[2..]);
    hmac.update(&[1, 44, 0, 0, 0, 0]);
    let mac = hmac.finalize().into_bytes();

    let mut rdata = ALGORITHM.to_vec();
    rdata.extend_from_slice(&time.to_be_bytes()[2..]);
    rdata.extend_from_slice(&[1, 44]);
    rdata.extend_from_slice(&(mac.len() as u16).to_be_bytes());
    rdata.extend_from_slice(&mac);
    rdata.extend_from_slice(&request.id.to_be_bytes());
    rdata.extend_from_slice(&[0, 0, 0, 0]);

    let mut signed = response;
    signed.extend_from_slice(&key_name);
    signed.extend_from_slice(&[0, 250, 0, 255, 0, 0, 0, 0]);
    signed.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    signed.extend_from_slice(&rdata);
    signed[11] = 1;
    signed
}

/// Operations of an UPDATE message, rendered like "delete A" / "add AAAA 2001:db8::2 60"
pub fn decode_update(bytes: &[u8]) -> Vec<String> {
    let header = ResponseHeader::parse(bytes).unwrap();
    assert_eq!(header.opcode, 5, "not an UPDATE");
    assert_eq!(header.qdcount, 1, "ZOCOUNT");
    assert_eq!(header.ancount, 0, "PRCOUNT");

    let mut reader = WireReader::new(bytes);
    reader.read_bytes(12).unwrap();
    reader.read_name().unwrap();
    assert_eq!(reader.read_u16().unwrap(), 6, "zone type is SOA");
    assert_eq!(reader.read_u16().unwrap(), 1, "zone class is IN");

    (0..header.nscount)
        .map(|_| {
            reader.read_name().unwrap();
            let rtype = reader.read_u16().unwrap();
            let class = reader.read_u16().unwrap();
            let ttl = reader.read_u32().unwrap();
            let rdlen = reader.read_u16().unwrap() as usize;
            let rdata = reader.read_bytes(rdlen).unwrap();

            let type_name = match rtype {
                1 => "A",
                28 => "AAAA",
                other => panic!("unexpected type {}", other),
            };

            match class {
                255 => {
                    assert_eq!((ttl, rdlen), (0, 0), "delete RRset has TTL 0, no rdata");
                    format!("delete {}", type_name)
                }
                1 => {
                    let addr = match rdata.len() {
                        4 => Ipv4Addr::from(<[u8; 4]>::try_from(rdata).unwrap()).to_string(),
                        16 => Ipv6Addr::from(<[u8; 16]>::try_from(rdata).unwrap()).to_string(),
                        n => panic!("unexpected rdata length {}", n),
                    };
                    format!("add {} {} {}", type_name, addr, ttl)
                }
                other => panic!("unexpected class {}", other),
            }
        })
        .collect()
}

/// A record in `example.com.` with both families enabled
pub fn record(name: &str) -> RecordConfig {
    RecordConfig::new(name, "example.com", SECRET, "ns1.example.com")
        .with_update_v4(true)
        .with_update_v6(true)
}

/// Helper to create a minimal DnsupConfig for testing
pub fn minimal_config(record_name: &str) -> DnsupConfig {
    DnsupConfig::new(vec![record(record_name)])
}
