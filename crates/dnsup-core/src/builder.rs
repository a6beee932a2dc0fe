//! Construction of UPDATE messages
//!
//! Each enabled family is replaced wholesale: a "delete RRset" followed by
//! one "add" per address. The delete is emitted even when the family has
//! no addresses, which clears stale records after losing connectivity.

use crate::config::RecordConfig;
use crate::error::Result;
use crate::state::Addresses;
use crate::wire::{Name, RData, TYPE_A, TYPE_AAAA, UpdateMessage, UpdateOp};

/// TTL of every added record (in seconds)
pub const UPDATE_TTL: u32 = 60;

/// Builds one UPDATE message per record
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateMessageBuilder;

impl UpdateMessageBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the message for `record` with a random id
    ///
    /// Returns `Ok(None)` when the record updates neither family; nothing
    /// should be sent for it.
    pub fn build(&self, record: &RecordConfig, addrs: &Addresses) -> Result<Option<UpdateMessage>> {
        self.build_with_id(rand::random(), record, addrs)
    }

    /// Build the message for `record` with a fixed id
    pub fn build_with_id(
        &self,
        id: u16,
        record: &RecordConfig,
        addrs: &Addresses,
    ) -> Result<Option<UpdateMessage>> {
        if !record.update_v4 && !record.update_v6 {
            return Ok(None);
        }

        let zone = Name::parse(&record.zone)?;
        let name = Name::parse(&record.name)?;
        let mut msg = UpdateMessage::new(id, zone, name);

        if record.update_v4 {
            msg.push(UpdateOp::DeleteRrset { rtype: TYPE_A });
            for addr in &addrs.v4 {
                msg.push(UpdateOp::Add {
                    ttl: UPDATE_TTL,
                    rdata: RData::A(*addr),
                });
            }
        }

        if record.update_v6 {
            msg.push(UpdateOp::DeleteRrset { rtype: TYPE_AAAA });
            for addr in &addrs.v6 {
                msg.push(UpdateOp::Add {
                    ttl: UPDATE_TTL,
                    rdata: RData::Aaaa(*addr),
                });
            }
        }

        Ok(Some(msg))
    }
}
