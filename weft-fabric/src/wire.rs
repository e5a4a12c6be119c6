// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Wire-level framings used when a flit's payload is itself a memory access.
//!
//! The fabric never interprets these; they are the contract between the
//! compute collaborators on either end of a circuit.

use weft_engine::sim_error;
use weft_engine::types::SimError;

use crate::types::{CHANNEL_ID_WIDTH, ChannelId};

const MEMORY_ADDRESS_WIDTH: u32 = 29;
const MEMORY_OPCODE_WIDTH: u32 = 3;
const CHANNEL_ADDRESS_WIDTH: u32 = 24;

/// Operation field of a memory request word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MemoryOpcode {
    Load = 0,
    Store = 1,
    IpkRead = 2,
    StoreLine = 3,
    FetchLine = 4,
    Payload = 5,
}

impl MemoryOpcode {
    /// Whether a request with this opcode is a complete packet by itself.
    ///
    /// Loads and fetches carry no data, so the request word terminates the
    /// packet. Stores open a packet that payload flits continue.
    pub fn ends_packet(&self) -> bool {
        match self {
            MemoryOpcode::Load | MemoryOpcode::IpkRead | MemoryOpcode::FetchLine => true,
            MemoryOpcode::Store | MemoryOpcode::StoreLine | MemoryOpcode::Payload => false,
        }
    }
}

impl TryFrom<u64> for MemoryOpcode {
    type Error = SimError;

    fn try_from(value: u64) -> Result<Self, SimError> {
        match value {
            0 => Ok(MemoryOpcode::Load),
            1 => Ok(MemoryOpcode::Store),
            2 => Ok(MemoryOpcode::IpkRead),
            3 => Ok(MemoryOpcode::StoreLine),
            4 => Ok(MemoryOpcode::FetchLine),
            5 => Ok(MemoryOpcode::Payload),
            _ => sim_error!("unknown memory opcode {value}"),
        }
    }
}

/// Memory request word: `[ spare ][ opcode : 3 ][ address : 29 ]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryRequest {
    pub opcode: MemoryOpcode,
    pub address: u32,
}

impl MemoryRequest {
    pub fn new(opcode: MemoryOpcode, address: u32) -> Self {
        debug_assert!(address < (1 << MEMORY_ADDRESS_WIDTH));
        Self { opcode, address }
    }

    pub fn pack(&self) -> u64 {
        ((self.opcode as u64) << MEMORY_ADDRESS_WIDTH) | u64::from(self.address)
    }

    pub fn unpack(word: u64) -> Result<Self, SimError> {
        let opcode =
            MemoryOpcode::try_from((word >> MEMORY_ADDRESS_WIDTH) & ((1 << MEMORY_OPCODE_WIDTH) - 1))?;
        let address = (word & ((1 << MEMORY_ADDRESS_WIDTH) - 1)) as u32;
        Ok(Self { opcode, address })
    }
}

/// Channel/address word: `[ address : 24 ][ channel id ][ rw : 1 ]`.
///
/// Bit 0 is the read/write bit; a set bit means write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelAddress {
    pub address: u32,
    pub channel: ChannelId,
    pub write: bool,
}

impl ChannelAddress {
    pub fn new(address: u32, channel: ChannelId, write: bool) -> Self {
        debug_assert!(address < (1 << CHANNEL_ADDRESS_WIDTH));
        Self {
            address,
            channel,
            write,
        }
    }

    pub fn pack(&self) -> u64 {
        (u64::from(self.address) << (CHANNEL_ID_WIDTH + 1))
            | (u64::from(self.channel.flatten()) << 1)
            | u64::from(self.write)
    }

    pub fn unpack(word: u64) -> Self {
        Self {
            address: ((word >> (CHANNEL_ID_WIDTH + 1)) & ((1 << CHANNEL_ADDRESS_WIDTH) - 1)) as u32,
            channel: ChannelId::from_flat(((word >> 1) & ((1 << CHANNEL_ID_WIDTH) - 1)) as u32),
            write: word & 1 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_request_layout() {
        let req = MemoryRequest::new(MemoryOpcode::FetchLine, 0x1234_5678 & 0x1fff_ffff);
        let word = req.pack();
        assert_eq!(word & 0x1fff_ffff, u64::from(req.address));
        assert_eq!((word >> 29) & 0x7, MemoryOpcode::FetchLine as u64);
        assert_eq!(MemoryRequest::unpack(word).unwrap(), req);
    }

    #[test]
    fn memory_request_bad_opcode() {
        let word = 7 << 29;
        assert!(MemoryRequest::unpack(word).is_err());
    }

    #[test]
    fn opcode_framing() {
        assert!(MemoryOpcode::Load.ends_packet());
        assert!(MemoryOpcode::IpkRead.ends_packet());
        assert!(MemoryOpcode::FetchLine.ends_packet());
        assert!(!MemoryOpcode::Store.ends_packet());
        assert!(!MemoryOpcode::StoreLine.ends_packet());
        assert!(!MemoryOpcode::Payload.ends_packet());
    }

    #[test]
    fn channel_address_layout() {
        let channel = ChannelId::new(2, 1, 3, 4);
        let ca = ChannelAddress::new(0xabcdef, channel, true);
        let word = ca.pack();
        assert_eq!(word & 1, 1);
        assert_eq!((word >> 1) & 0x3fff, u64::from(channel.flatten()));
        assert_eq!(ChannelAddress::unpack(word), ca);
    }
}
