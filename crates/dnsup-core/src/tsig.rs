//! TSIG signing of update requests (RFC 8945)
//!
//! The algorithm is fixed to HMAC-SHA256. It is a compatibility constant:
//! servers configured for another algorithm (HMAC-MD5 in older setups)
//! will reject the update with BADKEY, and there is no fallback.
//!
//! The key name is the record name being updated, so the server must hold
//! a key of that name.
//!
//! ## Digest input
//!
//! ```text
//! request:   message (ARCOUNT without TSIG)
//!            | key name | CLASS ANY | TTL 0 | algorithm | time | fudge | error | other
//! response:  request MAC length | request MAC
//!            | response (ARCOUNT - 1, original id) | same variables
//! ```
//!
//! Names in the digest are lower-cased and never compressed.

use crate::error::{Error, Result};
use crate::wire::{ARCOUNT_OFFSET, CLASS_ANY, Name, Rcode, TYPE_TSIG, UpdateMessage, find_tsig};
use crate::wire::{put_u16, put_u32, put_u48};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm name carried in every TSIG record
pub const ALGORITHM: &str = "hmac-sha256.";

/// Permitted clock skew (in seconds)
pub const FUDGE: u16 = 300;

/// A signed request ready for the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    /// Message id, echoed by the server
    pub id: u16,
    /// Name of the signing key
    pub key_name: Name,
    /// Complete wire message including the TSIG record
    pub bytes: Vec<u8>,
    /// MAC of the request; the response signature covers it
    pub mac: Vec<u8>,
    /// Signing time (seconds since the epoch)
    pub time_signed: u64,
}

/// Signs requests and verifies responses with a shared secret
#[derive(Debug, Clone)]
pub struct TsigSigner {
    algorithm: Name,
    fudge: u16,
}

impl Default for TsigSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl TsigSigner {
    pub fn new() -> Self {
        Self {
            algorithm: Name::from_static(&["hmac-sha256"]),
            fudge: FUDGE,
        }
    }

    /// Sign `msg` with the current time
    pub fn sign(&self, msg: &UpdateMessage, key_name: &str, secret: &[u8]) -> Result<SignedMessage> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.sign_at(msg, key_name, secret, now)
    }

    /// Sign `msg` as of `time_signed`; deterministic for identical inputs
    pub fn sign_at(
        &self,
        msg: &UpdateMessage,
        key_name: &str,
        secret: &[u8],
        time_signed: u64,
    ) -> Result<SignedMessage> {
        let key_name = Name::parse(key_name)?;
        let mut bytes = msg.to_wire()?;

        let mut hmac = new_hmac(secret)?;
        hmac.update(&bytes);
        hmac.update(&self.variables(&key_name, time_signed, Rcode::NOERROR, &[]));
        let mac = hmac.finalize().into_bytes().to_vec();

        self.append_record(&mut bytes, &key_name, time_signed, &mac, msg.id)?;

        debug!(
            "Signed update {:#06x} for {} ({} bytes)",
            msg.id,
            key_name,
            bytes.len()
        );

        Ok(SignedMessage {
            id: msg.id,
            key_name,
            bytes,
            mac,
            time_signed,
        })
    }

    /// Check the server's signature on a response to `request`
    ///
    /// Fails if the response is unsigned, carries a TSIG error, uses another
    /// key or algorithm, or does not match.
    pub fn verify_response(
        &self,
        request: &SignedMessage,
        response: &[u8],
        secret: &[u8],
    ) -> Result<()> {
        let tsig = find_tsig(response)?.ok_or_else(|| Error::tsig("response is not signed"))?;

        if tsig.error.is_error() {
            return Err(Error::tsig(format!("server reported {}", tsig.error)));
        }
        if tsig.key_name != request.key_name {
            return Err(Error::tsig(format!(
                "response signed with unexpected key {}",
                tsig.key_name
            )));
        }
        if tsig.algorithm != self.algorithm {
            return Err(Error::tsig(format!(
                "response signed with unexpected algorithm {}",
                tsig.algorithm
            )));
        }

        // The signed data is the response as it was before the TSIG record
        // was added: original id, one record less.
        let mut unsigned = response[..tsig.offset].to_vec();
        unsigned[..2].copy_from_slice(&tsig.original_id.to_be_bytes());
        let arcount = u16::from_be_bytes([unsigned[ARCOUNT_OFFSET], unsigned[ARCOUNT_OFFSET + 1]]);
        unsigned[ARCOUNT_OFFSET..ARCOUNT_OFFSET + 2]
            .copy_from_slice(&arcount.saturating_sub(1).to_be_bytes());

        let mut hmac = new_hmac(secret)?;
        hmac.update(&(request.mac.len() as u16).to_be_bytes());
        hmac.update(&request.mac);
        hmac.update(&unsigned);
        hmac.update(&self.variables_with_fudge(
            &tsig.key_name,
            tsig.time_signed,
            tsig.fudge,
            tsig.error,
            &tsig.other,
        ));

        hmac.verify_slice(&tsig.mac)
            .map_err(|_| Error::tsig("response signature mismatch"))
    }

    fn variables(&self, key_name: &Name, time_signed: u64, error: Rcode, other: &[u8]) -> Vec<u8> {
        self.variables_with_fudge(key_name, time_signed, self.fudge, error, other)
    }

    fn variables_with_fudge(
        &self,
        key_name: &Name,
        time_signed: u64,
        fudge: u16,
        error: Rcode,
        other: &[u8],
    ) -> Vec<u8> {
        let mut vars = Vec::with_capacity(64);
        key_name.compose_canonical(&mut vars);
        put_u16(&mut vars, CLASS_ANY);
        put_u32(&mut vars, 0);
        self.algorithm.compose_canonical(&mut vars);
        put_u48(&mut vars, time_signed);
        put_u16(&mut vars, fudge);
        put_u16(&mut vars, error.0);
        put_u16(&mut vars, other.len() as u16);
        vars.extend_from_slice(other);
        vars
    }

    fn append_record(
        &self,
        bytes: &mut Vec<u8>,
        key_name: &Name,
        time_signed: u64,
        mac: &[u8],
        original_id: u16,
    ) -> Result<()> {
        let mut rdata = Vec::with_capacity(64);
        self.algorithm.compose(&mut rdata);
        put_u48(&mut rdata, time_signed);
        put_u16(&mut rdata, self.fudge);
        put_u16(&mut rdata, mac.len() as u16);
        rdata.extend_from_slice(mac);
        put_u16(&mut rdata, original_id);
        put_u16(&mut rdata, 0);
        put_u16(&mut rdata, 0);

        key_name.compose(bytes);
        put_u16(bytes, TYPE_TSIG);
        put_u16(bytes, CLASS_ANY);
        put_u32(bytes, 0);
        put_u16(bytes, rdata.len() as u16);
        bytes.extend_from_slice(&rdata);

        let arcount = u16::from_be_bytes([bytes[ARCOUNT_OFFSET], bytes[ARCOUNT_OFFSET + 1]])
            .checked_add(1)
            .ok_or_else(|| Error::encoding("additional section is full"))?;
        bytes[ARCOUNT_OFFSET..ARCOUNT_OFFSET + 2].copy_from_slice(&arcount.to_be_bytes());

        Ok(())
    }
}

fn new_hmac(secret: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret).map_err(|e| Error::tsig(format!("invalid key: {}", e)))
}
