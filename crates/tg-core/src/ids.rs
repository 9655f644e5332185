//! Strongly typed identifiers.
//!
//! Two families live here:
//!
//! - Dense positional indices (`EdgeIndex`, `WayIndex`) generated by
//!   `typed_id!`.  They index the external edge sequence and the way table.
//! - The graph identifier triple (`GraphId`) and its tile component
//!   (`TileId`).  A `GraphId` names one node permanently once assigned and is
//!   never reused within a build.
//!
//! # GraphId bit layout
//!
//! ```text
//!  63        46 45          25 24            3 2     0
//! ┌───────────┬──────────────┬───────────────┬───────┐
//! │  unused   │ index (21)   │  tile (22)    │ level │
//! └───────────┴──────────────┴───────────────┴───────┘
//! ```
//!
//! All field bits set is the `INVALID` sentinel.  The in-memory form is a
//! plain struct ordered by `(level, tile, index)`; the packed form exists only
//! for fixed-width records on disk.

use std::fmt;

use crate::{CoreError, CoreResult};

/// Generate a typed index wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid index".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` or sequence index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Position of an edge record in the external edge sequence.
    pub struct EdgeIndex(u32);
}

typed_id! {
    /// Position of a source way in the parsed way table.
    pub struct WayIndex(u32);
}

// ── Field widths ──────────────────────────────────────────────────────────────

const LEVEL_BITS: u32 = 3;
const TILE_BITS:  u32 = 22;
const INDEX_BITS: u32 = 21;

/// Largest representable hierarchy level.
pub const MAX_LEVEL: u8 = (1 << LEVEL_BITS) as u8 - 1;
/// Largest representable tile number.
pub const MAX_TILE: u32 = (1 << TILE_BITS) - 1;
/// Largest representable index within a tile.
pub const MAX_INDEX: u32 = (1 << INDEX_BITS) - 1;

// ── TileId ────────────────────────────────────────────────────────────────────

/// A tile at one hierarchy level: the unit of spatial partitioning and of
/// parallel output.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileId {
    pub level: u8,
    pub tile: u32,
}

impl TileId {
    pub fn new(level: u8, tile: u32) -> CoreResult<Self> {
        if level > MAX_LEVEL || tile > MAX_TILE {
            return Err(CoreError::InvalidGraphId { level, tile, index: 0 });
        }
        Ok(Self { level, tile })
    }

    /// The graph id of the `index`-th object in this tile.
    pub fn graph_id(self, index: u32) -> CoreResult<GraphId> {
        let id = GraphId { level: self.level, tile: self.tile, index };
        if index > MAX_INDEX || !id.is_valid() {
            return Err(CoreError::IndexOverflow { tile: self, index });
        }
        Ok(id)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.level, self.tile)
    }
}

// ── GraphId ───────────────────────────────────────────────────────────────────

/// Compact (level, tile, index) identifier of a graph node.
///
/// Field order matters: the derived `Ord` sorts by level, then tile, then
/// index.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphId {
    pub level: u8,
    pub tile: u32,
    pub index: u32,
}

impl GraphId {
    /// Sentinel for "not yet assigned" (e.g. the target of an edge under
    /// construction).
    pub const INVALID: GraphId = GraphId {
        level: MAX_LEVEL,
        tile:  MAX_TILE,
        index: MAX_INDEX,
    };

    /// Construct a graph id, rejecting fields that do not fit their widths.
    pub fn new(level: u8, tile: u32, index: u32) -> CoreResult<Self> {
        if level > MAX_LEVEL || tile > MAX_TILE || index > MAX_INDEX {
            return Err(CoreError::InvalidGraphId { level, tile, index });
        }
        Ok(Self { level, tile, index })
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// The tile this id belongs to.
    #[inline]
    pub fn tile_id(self) -> TileId {
        TileId { level: self.level, tile: self.tile }
    }

    /// Pack into the fixed-width on-disk representation.
    #[inline]
    pub fn to_bits(self) -> u64 {
        (self.level as u64)
            | ((self.tile as u64) << LEVEL_BITS)
            | ((self.index as u64) << (LEVEL_BITS + TILE_BITS))
    }

    /// Unpack from the on-disk representation.  Bits above the index field
    /// are ignored.
    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        Self {
            level: (bits & MAX_LEVEL as u64) as u8,
            tile:  ((bits >> LEVEL_BITS) & MAX_TILE as u64) as u32,
            index: ((bits >> (LEVEL_BITS + TILE_BITS)) & MAX_INDEX as u64) as u32,
        }
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}/{}/{}", self.level, self.tile, self.index)
        } else {
            f.write_str("invalid")
        }
    }
}
