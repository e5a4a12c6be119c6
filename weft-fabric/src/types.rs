// Copyright (c) 2026 The Weft Authors. All rights reserved.

//! Shared fabric types.
//!
//! The unit of transmission is the [Flit]. A packet is an ordered run of
//! flits sharing one source to destination path, closed by exactly one flit
//! with the end-of-packet flag set.

use std::mem::size_of;

use weft_engine::traits::{Routable, SimObject, TotalBytes};
use weft_engine::types::ReqType;
use weft_track::Tag;
use weft_track::tag::Tagged;

/// Bit positions of the flat [ChannelId] encoding.
///
/// `channel` occupies bits 2..0, the multicast flag bit 3 (always zero for
/// point-to-point traffic), `component` bits 7..4, `tile_y` bits 10..8 and
/// `tile_x` bits 13..11.
pub const CHANNEL_SHIFT: u32 = 0;
pub const CHANNEL_WIDTH: u32 = 3;
pub const MULTICAST_SHIFT: u32 = 3;
pub const COMPONENT_SHIFT: u32 = 4;
pub const COMPONENT_WIDTH: u32 = 4;
pub const TILE_Y_SHIFT: u32 = 8;
pub const TILE_Y_WIDTH: u32 = 3;
pub const TILE_X_SHIFT: u32 = 11;
pub const TILE_X_WIDTH: u32 = 3;

/// Total width of a flat [ChannelId].
pub const CHANNEL_ID_WIDTH: u32 = TILE_X_SHIFT + TILE_X_WIDTH;

const fn mask(width: u32) -> u32 {
    (1 << width) - 1
}

/// Globally unique identifier of a logical fabric endpoint.
///
/// An endpoint is one channel of one component (core or memory bank) of one
/// tile. The flat encoding and the three-field form are exact inverses of
/// each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId {
    pub tile_x: u8,
    pub tile_y: u8,
    pub component: u8,
    pub channel: u8,
}

impl ChannelId {
    pub fn new(tile_x: u8, tile_y: u8, component: u8, channel: u8) -> Self {
        debug_assert!(u32::from(tile_x) <= mask(TILE_X_WIDTH));
        debug_assert!(u32::from(tile_y) <= mask(TILE_Y_WIDTH));
        debug_assert!(u32::from(component) <= mask(COMPONENT_WIDTH));
        debug_assert!(u32::from(channel) <= mask(CHANNEL_WIDTH));
        Self {
            tile_x,
            tile_y,
            component,
            channel,
        }
    }

    /// The flat integer form used on the wire and as a routing key.
    pub fn flatten(&self) -> u32 {
        (u32::from(self.tile_x) << TILE_X_SHIFT)
            | (u32::from(self.tile_y) << TILE_Y_SHIFT)
            | (u32::from(self.component) << COMPONENT_SHIFT)
            | (u32::from(self.channel) << CHANNEL_SHIFT)
    }

    pub fn from_flat(flat: u32) -> Self {
        Self {
            tile_x: ((flat >> TILE_X_SHIFT) & mask(TILE_X_WIDTH)) as u8,
            tile_y: ((flat >> TILE_Y_SHIFT) & mask(TILE_Y_WIDTH)) as u8,
            component: ((flat >> COMPONENT_SHIFT) & mask(COMPONENT_WIDTH)) as u8,
            channel: ((flat >> CHANNEL_SHIFT) & mask(CHANNEL_WIDTH)) as u8,
        }
    }

    pub fn tile(&self) -> (u8, u8) {
        (self.tile_x, self.tile_y)
    }

    pub fn component(&self) -> u8 {
        self.component
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t({},{}).c{}.ch{}",
            self.tile_x, self.tile_y, self.component, self.channel
        )
    }
}

/// Objects that carry packet framing.
///
/// The wormhole arbitration policy uses this to know when a grant hold can be
/// released.
pub trait Framed {
    fn end_of_packet(&self) -> bool;
}

// Plain integers stand in for single-flit traffic in component tests.
impl Framed for i32 {
    fn end_of_packet(&self) -> bool {
        true
    }
}

impl Framed for usize {
    fn end_of_packet(&self) -> bool {
        true
    }
}

/// The atomic unit accepted by the fabric in one cycle.
///
/// The payload is opaque to the fabric; only the destination and the three
/// flags are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flit {
    pub payload: u64,
    pub dest: ChannelId,
    pub eop: bool,
    pub port_claim: bool,
    pub uses_credits: bool,
}

impl Flit {
    /// An ordinary data flit.
    pub fn data(payload: u64, dest: ChannelId, eop: bool) -> Self {
        Self {
            payload,
            dest,
            eop,
            port_claim: false,
            uses_credits: true,
        }
    }

    /// A port-claim flit: control plane only, never buffered as data.
    ///
    /// The payload is the claiming sender's own flattened return address, so
    /// the receiver knows where credits go.
    pub fn claim(source: ChannelId, dest: ChannelId, uses_credits: bool) -> Self {
        Self {
            payload: u64::from(source.flatten()),
            dest,
            eop: true,
            port_claim: true,
            uses_credits,
        }
    }

    /// A credit flit, travelling on the credit sub-network.
    pub fn credit(dest: ChannelId) -> Self {
        Self {
            payload: 1,
            dest,
            eop: true,
            port_claim: false,
            uses_credits: false,
        }
    }
}

impl Framed for Flit {
    fn end_of_packet(&self) -> bool {
        self.eop
    }
}

impl TotalBytes for Flit {
    fn total_bytes(&self) -> usize {
        size_of::<u64>()
    }
}

impl Routable for Flit {
    fn dest(&self) -> u64 {
        u64::from(self.dest.flatten())
    }
    fn req_type(&self) -> ReqType {
        if self.port_claim {
            ReqType::Control
        } else {
            ReqType::Write
        }
    }
}

impl Tagged for Flit {
    fn tag(&self) -> Tag {
        Tag(self.payload)
    }
}

impl std::fmt::Display for Flit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.port_claim {
            "claim"
        } else if self.eop {
            "data/eop"
        } else {
            "data"
        };
        write!(f, "{} {:#x} -> {}", kind, self.payload, self.dest)
    }
}

impl SimObject for Flit {}

/// The `DataGenerator` is what a [source](crate::source) uses to generate
/// data values to send.
pub type DataGenerator<T> = Box<dyn Iterator<Item = T> + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_round_trip() {
        let id = ChannelId::new(5, 3, 12, 6);
        assert_eq!(ChannelId::from_flat(id.flatten()), id);
    }

    #[test]
    fn channel_id_bit_positions() {
        let id = ChannelId::new(1, 1, 1, 1);
        assert_eq!(id.flatten(), (1 << 11) | (1 << 8) | (1 << 4) | 1);

        // The multicast bit is never set for point-to-point ids
        let id = ChannelId::new(7, 7, 15, 7);
        assert_eq!(id.flatten() & (1 << MULTICAST_SHIFT), 0);
    }

    #[test]
    fn claim_carries_return_address() {
        let source = ChannelId::new(0, 0, 2, 1);
        let dest = ChannelId::new(1, 0, 0, 0);
        let flit = Flit::claim(source, dest, true);
        assert!(flit.port_claim);
        assert!(flit.eop);
        assert_eq!(ChannelId::from_flat(flit.payload as u32), source);
    }
}
