//! The RFC 2136 UPDATE message
//!
//! ```text
//! Header     opcode UPDATE, ZOCOUNT 1, PRCOUNT 0, UPCOUNT n, ADCOUNT 0
//! Zone       <zone> SOA IN
//! Update     <name> <type> ANY 0 (empty)          delete RRset
//!            <name> <type> IN <ttl> <rdata>       add RR
//! ```
//!
//! The TSIG record is appended by [`crate::tsig::TsigSigner`].

use super::{CLASS_ANY, CLASS_IN, HEADER_LEN, Name, OPCODE_UPDATE, TYPE_A, TYPE_AAAA, TYPE_SOA};
use super::{put_u16, put_u32};
use crate::error::{Error, Result};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Record data for the types this client adds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
}

impl RData {
    pub fn rtype(&self) -> u16 {
        match self {
            RData::A(_) => TYPE_A,
            RData::Aaaa(_) => TYPE_AAAA,
        }
    }

    fn compose(&self, buf: &mut Vec<u8>) {
        match self {
            RData::A(addr) => {
                put_u16(buf, 4);
                buf.extend_from_slice(&addr.octets());
            }
            RData::Aaaa(addr) => {
                put_u16(buf, 16);
                buf.extend_from_slice(&addr.octets());
            }
        }
    }
}

/// One entry of the update section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// Remove every record of `rtype` at the name
    DeleteRrset { rtype: u16 },
    /// Add one record
    Add { ttl: u32, rdata: RData },
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOp::DeleteRrset { rtype } => write!(f, "delete {} *", type_name(*rtype)),
            UpdateOp::Add { ttl, rdata } => match rdata {
                RData::A(addr) => write!(f, "add A {} TTL {}", addr, ttl),
                RData::Aaaa(addr) => write!(f, "add AAAA {} TTL {}", addr, ttl),
            },
        }
    }
}

fn type_name(rtype: u16) -> String {
    match rtype {
        TYPE_A => "A".to_string(),
        TYPE_AAAA => "AAAA".to_string(),
        other => format!("TYPE{}", other),
    }
}

/// An unsigned UPDATE message for a single name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessage {
    /// Message id; the response must echo it
    pub id: u16,
    /// Zone section
    pub zone: Name,
    /// Owner name of every update operation
    pub name: Name,
    ops: Vec<UpdateOp>,
}

impl UpdateMessage {
    pub fn new(id: u16, zone: Name, name: Name) -> Self {
        Self {
            id,
            zone,
            name,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: UpdateOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Encode the message with an empty additional section
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let upcount = u16::try_from(self.ops.len())
            .map_err(|_| Error::encoding("too many update operations"))?;

        let mut buf = Vec::with_capacity(512);

        // Header
        put_u16(&mut buf, self.id);
        buf.push(OPCODE_UPDATE << 3);
        buf.push(0);
        put_u16(&mut buf, 1);
        put_u16(&mut buf, 0);
        put_u16(&mut buf, upcount);
        put_u16(&mut buf, 0);
        debug_assert_eq!(buf.len(), HEADER_LEN);

        // Zone
        self.zone.compose(&mut buf);
        put_u16(&mut buf, TYPE_SOA);
        put_u16(&mut buf, CLASS_IN);

        // Update
        for op in &self.ops {
            self.name.compose(&mut buf);
            match op {
                UpdateOp::DeleteRrset { rtype } => {
                    put_u16(&mut buf, *rtype);
                    put_u16(&mut buf, CLASS_ANY);
                    put_u32(&mut buf, 0);
                    put_u16(&mut buf, 0);
                }
                UpdateOp::Add { ttl, rdata } => {
                    put_u16(&mut buf, rdata.rtype());
                    put_u16(&mut buf, CLASS_IN);
                    put_u32(&mut buf, *ttl);
                    rdata.compose(&mut buf);
                }
            }
        }

        Ok(buf)
    }
}
