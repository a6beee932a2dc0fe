//! Parsing of update responses
//!
//! A response is only inspected for its header and, if present, the TSIG
//! record that closes the additional section.

use super::{Name, Rcode, TYPE_TSIG, WireReader};
use crate::error::{Error, Result};

/// Fixed header fields of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub id: u16,
    pub is_response: bool,
    pub opcode: u8,
    pub rcode: Rcode,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl ResponseHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(bytes);
        Self::read(&mut reader)
    }

    fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let id = reader.read_u16()?;
        let flags1 = reader.read_u8()?;
        let flags2 = reader.read_u8()?;

        Ok(Self {
            id,
            is_response: flags1 & 0x80 != 0,
            opcode: (flags1 >> 3) & 0x0F,
            rcode: Rcode((flags2 & 0x0F) as u16),
            qdcount: reader.read_u16()?,
            ancount: reader.read_u16()?,
            nscount: reader.read_u16()?,
            arcount: reader.read_u16()?,
        })
    }
}

/// The TSIG record of a received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsigRecord {
    /// Offset of the record's owner name; the signed data ends here
    pub offset: usize,
    pub key_name: Name,
    pub algorithm: Name,
    pub time_signed: u64,
    pub fudge: u16,
    pub mac: Vec<u8>,
    pub original_id: u16,
    pub error: Rcode,
    pub other: Vec<u8>,
}

/// Locate the TSIG record, which must be the last additional record
pub fn find_tsig(bytes: &[u8]) -> Result<Option<TsigRecord>> {
    let mut reader = WireReader::new(bytes);
    let header = ResponseHeader::read(&mut reader)?;

    for _ in 0..header.qdcount {
        reader.read_name()?;
        reader.read_bytes(4)?;
    }

    let records = header.ancount as usize + header.nscount as usize + header.arcount as usize;
    for index in 0..records {
        let offset = reader.position();
        let owner = reader.read_name()?;
        let rtype = reader.read_u16()?;
        let _class = reader.read_u16()?;
        let _ttl = reader.read_u32()?;
        let rdlen = reader.read_u16()? as usize;
        let rdata = reader.read_bytes(rdlen)?;

        if rtype != TYPE_TSIG {
            continue;
        }
        if index + 1 != records {
            return Err(Error::malformed("TSIG record is not the last record"));
        }

        let mut rd = WireReader::new(rdata);
        let algorithm = rd.read_name()?;
        let time_signed = rd.read_u48()?;
        let fudge = rd.read_u16()?;
        let mac_len = rd.read_u16()? as usize;
        let mac = rd.read_bytes(mac_len)?.to_vec();
        let original_id = rd.read_u16()?;
        let error = Rcode(rd.read_u16()?);
        let other_len = rd.read_u16()? as usize;
        let other = rd.read_bytes(other_len)?.to_vec();

        return Ok(Some(TsigRecord {
            offset,
            key_name: owner,
            algorithm,
            time_signed,
            fudge,
            mac,
            original_id,
            error,
            other,
        }));
    }

    Ok(None)
}
