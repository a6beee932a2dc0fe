//! DNS wire format for dynamic updates
//!
//! Only what an RFC 2136 client needs: names, the UPDATE message, the TSIG
//! record and enough response parsing to read the header and the server's
//! TSIG. Names are always written uncompressed; there is no compression
//! code path in this crate.

pub mod message;
pub mod name;
pub mod reader;
pub mod response;

pub use message::{RData, UpdateMessage, UpdateOp};
pub use name::Name;
pub use reader::WireReader;
pub use response::{ResponseHeader, TsigRecord, find_tsig};

/// Resource record type A
pub const TYPE_A: u16 = 1;
/// Resource record type SOA
pub const TYPE_SOA: u16 = 6;
/// Resource record type AAAA
pub const TYPE_AAAA: u16 = 28;
/// Resource record type TSIG
pub const TYPE_TSIG: u16 = 250;

/// Class IN
pub const CLASS_IN: u16 = 1;
/// Class ANY (RRset deletion, TSIG)
pub const CLASS_ANY: u16 = 255;

/// Opcode UPDATE
pub const OPCODE_UPDATE: u8 = 5;

/// Size of the fixed message header
pub const HEADER_LEN: usize = 12;

/// Byte offset of ARCOUNT in the header
pub const ARCOUNT_OFFSET: usize = 10;

/// Response codes an update server may return
///
/// Extended TSIG error codes (BADSIG, BADKEY, BADTIME) travel in the TSIG
/// record's error field and are reported through [`Rcode::name`] as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rcode(pub u16);

impl Rcode {
    pub const NOERROR: Rcode = Rcode(0);

    /// Mnemonic for logging
    pub fn name(self) -> String {
        match self.0 {
            0 => "NOERROR".to_string(),
            1 => "FORMERR".to_string(),
            2 => "SERVFAIL".to_string(),
            3 => "NXDOMAIN".to_string(),
            4 => "NOTIMP".to_string(),
            5 => "REFUSED".to_string(),
            6 => "YXDOMAIN".to_string(),
            7 => "YXRRSET".to_string(),
            8 => "NXRRSET".to_string(),
            9 => "NOTAUTH".to_string(),
            10 => "NOTZONE".to_string(),
            16 => "BADSIG".to_string(),
            17 => "BADKEY".to_string(),
            18 => "BADTIME".to_string(),
            other => format!("RCODE{}", other),
        }
    }

    pub fn is_error(self) -> bool {
        self != Rcode::NOERROR
    }
}

impl std::fmt::Display for Rcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

pub(crate) fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// 48-bit big-endian time, as used by TSIG
pub(crate) fn put_u48(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_be_bytes()[2..]);
}
