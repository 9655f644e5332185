//! Edge records and their packed attribute block.
//!
//! # Attribute bit layout (`EdgeAttributes::to_bits`)
//!
//! ```text
//!  31      25  24   23   22   21   20   19  18   16 15              0
//! ┌──────────┬────┬────┬────┬────┬────┬────┬───────┬────────────────┐
//! │  spare   │link│bsig│fsig│sig │rev │fwd │ class │  shape count   │
//! └──────────┴────┴────┴────┴────┴────┴────┴───────┴────────────────┘
//! ```
//!
//! # Record layout (28 bytes, little-endian)
//!
//! | Offset | Width | Field                       |
//! |--------|-------|-----------------------------|
//! | 0      | 8     | source `GraphId` (packed)   |
//! | 8      | 4     | way index                   |
//! | 12     | 4     | shape index                 |
//! | 16     | 4     | attributes                  |
//! | 20     | 8     | target `GraphId` (packed)   |
//!
//! One record per run of a way.  `forward` and `reverse` say which ways the
//! run may be driven; a two-way street is one record with both set.

use tg_core::{GraphId, RoadClass, WayIndex};
use tg_osm::{OsmWay, SignalDirection};

use crate::sequence::FixedRecord;

// ── EdgeAttributes ────────────────────────────────────────────────────────────

/// Routing attributes of one edge.  Every field may be changed after
/// construction; the link reclassifier rewrites `importance`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeAttributes {
    /// Coordinates in the edge's run, end node included (always ≥ 1).
    pub shape_count: u16,
    pub importance: RoadClass,
    pub forward: bool,
    pub reverse: bool,
    /// A traffic signal sits on one of the edge's shape points.
    pub traffic_signal: bool,
    pub forward_signal: bool,
    pub backward_signal: bool,
    pub link: bool,
}

const CLASS_SHIFT:    u32 = 16;
const FORWARD_BIT:    u32 = 1 << 19;
const REVERSE_BIT:    u32 = 1 << 20;
const SIGNAL_BIT:     u32 = 1 << 21;
const FWD_SIGNAL_BIT: u32 = 1 << 22;
const BWD_SIGNAL_BIT: u32 = 1 << 23;
const LINK_BIT:       u32 = 1 << 24;

impl EdgeAttributes {
    pub fn to_bits(self) -> u32 {
        let flag = |set: bool, bit: u32| if set { bit } else { 0 };
        self.shape_count as u32
            | (self.importance.rank() as u32) << CLASS_SHIFT
            | flag(self.forward, FORWARD_BIT)
            | flag(self.reverse, REVERSE_BIT)
            | flag(self.traffic_signal, SIGNAL_BIT)
            | flag(self.forward_signal, FWD_SIGNAL_BIT)
            | flag(self.backward_signal, BWD_SIGNAL_BIT)
            | flag(self.link, LINK_BIT)
    }

    /// Inverse of [`to_bits`](Self::to_bits).  Spare bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            shape_count:     (bits & 0xFFFF) as u16,
            importance:      RoadClass::from_bits((bits >> CLASS_SHIFT) as u8),
            forward:         bits & FORWARD_BIT != 0,
            reverse:         bits & REVERSE_BIT != 0,
            traffic_signal:  bits & SIGNAL_BIT != 0,
            forward_signal:  bits & FWD_SIGNAL_BIT != 0,
            backward_signal: bits & BWD_SIGNAL_BIT != 0,
            link:            bits & LINK_BIT != 0,
        }
    }
}

// ── Edge ──────────────────────────────────────────────────────────────────────

/// One run of a source way between two graph nodes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub source: GraphId,
    pub way_index: WayIndex,
    /// Position of the first run coordinate after the source node in the
    /// shared shape sequence.  The source coordinate is at `shape_index - 1`.
    pub shape_index: u32,
    pub attributes: EdgeAttributes,
    pub target: GraphId,
}

impl Edge {
    /// An edge over `shape_count` coordinates of `way`, with attributes
    /// taken from the way's class, direction and link flags.
    pub fn new(
        source: GraphId,
        target: GraphId,
        way_index: WayIndex,
        shape_index: u32,
        shape_count: u16,
        way: &OsmWay,
    ) -> Self {
        Self {
            source,
            way_index,
            shape_index,
            attributes: EdgeAttributes {
                shape_count,
                importance: way.road_class,
                forward: way.forward,
                reverse: way.backward,
                link: way.link,
                ..EdgeAttributes::default()
            },
            target,
        }
    }

    /// The endpoint that is not `node`.  For a loop both ends are `node`.
    #[inline]
    pub fn other_end(&self, node: GraphId) -> GraphId {
        if self.source == node { self.target } else { self.source }
    }

    /// `true` if the edge can be driven away from `node`.
    #[inline]
    pub fn leaves(&self, node: GraphId) -> bool {
        (self.source == node && self.attributes.forward)
            || (self.target == node && self.attributes.reverse)
    }

    /// Record a traffic signal on one of the edge's shape points.
    pub fn mark_signal(&mut self, direction: SignalDirection) {
        let a = &mut self.attributes;
        a.traffic_signal = true;
        match direction {
            SignalDirection::Both => {
                a.forward_signal = true;
                a.backward_signal = true;
            }
            SignalDirection::Forward  => a.forward_signal = true,
            SignalDirection::Backward => a.backward_signal = true,
        }
    }
}

impl FixedRecord for Edge {
    const SIZE: usize = 28;

    fn encode(&self, buf: &mut [u8]) {
        buf[0..8].copy_from_slice(&self.source.to_bits().to_le_bytes());
        buf[8..12].copy_from_slice(&self.way_index.0.to_le_bytes());
        buf[12..16].copy_from_slice(&self.shape_index.to_le_bytes());
        buf[16..20].copy_from_slice(&self.attributes.to_bits().to_le_bytes());
        buf[20..28].copy_from_slice(&self.target.to_bits().to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Self {
        let u32_at = |o: usize| u32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]);
        let u64_at = |o: usize| (u32_at(o) as u64) | (u32_at(o + 4) as u64) << 32;
        Self {
            source:      GraphId::from_bits(u64_at(0)),
            way_index:   WayIndex(u32_at(8)),
            shape_index: u32_at(12),
            attributes:  EdgeAttributes::from_bits(u32_at(16)),
            target:      GraphId::from_bits(u64_at(20)),
        }
    }
}
