//! Bounds-checked reading of received messages
//!
//! Responses may use name compression, so the reader follows pointers when
//! reading names. Writing never compresses.

use super::Name;
use crate::error::{Error, Result};

/// Upper bound on pointer hops while reading one name
const MAX_POINTER_HOPS: usize = 32;

/// Cursor over a received message
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::malformed(format!(
                "need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u48(&mut self) -> Result<u64> {
        let b = self.read_bytes(6)?;
        let mut full = [0u8; 8];
        full[2..].copy_from_slice(b);
        Ok(u64::from_be_bytes(full))
    }

    /// Read a possibly compressed name
    pub fn read_name(&mut self) -> Result<Name> {
        let mut labels = Vec::new();
        let mut pos = self.pos;
        let mut resume = None;
        let mut hops = 0;

        loop {
            let len = *self
                .buf
                .get(pos)
                .ok_or_else(|| Error::malformed("name runs past end of message"))?;

            match len & 0xC0 {
                0x00 => {
                    pos += 1;
                    if len == 0 {
                        break;
                    }
                    let end = pos + len as usize;
                    let label = self
                        .buf
                        .get(pos..end)
                        .ok_or_else(|| Error::malformed("label runs past end of message"))?;
                    labels.push(label.to_vec());
                    pos = end;
                }
                0xC0 => {
                    let low = *self
                        .buf
                        .get(pos + 1)
                        .ok_or_else(|| Error::malformed("truncated compression pointer"))?;
                    let target = (((len & 0x3F) as usize) << 8) | low as usize;

                    hops += 1;
                    if hops > MAX_POINTER_HOPS || target >= pos {
                        return Err(Error::malformed("invalid compression pointer"));
                    }
                    if resume.is_none() {
                        resume = Some(pos + 2);
                    }
                    pos = target;
                }
                other => {
                    return Err(Error::malformed(format!(
                        "unsupported label type {:#04x}",
                        other
                    )));
                }
            }
        }

        self.pos = resume.unwrap_or(pos);
        Name::from_labels(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_pointers() {
        // "example.com." at 0, then "host" + pointer to 0.
        let mut msg = b"\x07example\x03com\x00".to_vec();
        msg.extend_from_slice(b"\x04host\xC0\x00\xAA");

        let mut reader = WireReader::new(&msg);
        let first = reader.read_name().unwrap();
        assert_eq!(first.to_string(), "example.com.");

        let second = reader.read_name().unwrap();
        assert_eq!(second.to_string(), "host.example.com.");
        assert_eq!(reader.read_u8().unwrap(), 0xAA);
    }

    #[test]
    fn rejects_forward_pointer_loops() {
        let msg = b"\xC0\x00";
        assert!(WireReader::new(msg).read_name().is_err());
    }

    #[test]
    fn short_reads_fail() {
        let mut reader = WireReader::new(&[0x01]);
        assert!(reader.read_u16().is_err());
    }
}
