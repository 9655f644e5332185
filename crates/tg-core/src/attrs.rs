//! Routing attribute enums shared by source records and graph records.

use std::fmt;

// ── RoadClass ─────────────────────────────────────────────────────────────────

/// Road importance rank.  Numerically smaller is more important; the derived
/// `Ord` follows the discriminant, so `a.min(b)` picks the better class.
///
/// Stored in 3 bits inside the packed edge attributes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RoadClass {
    Motorway    = 0,
    Trunk       = 1,
    Primary     = 2,
    Secondary   = 3,
    Tertiary    = 4,
    Residential = 5,
    Service     = 6,
    #[default]
    Other       = 7,
}

impl RoadClass {
    /// Decode the low three bits of `v`.
    pub fn from_bits(v: u8) -> Self {
        match v & 0b111 {
            0 => RoadClass::Motorway,
            1 => RoadClass::Trunk,
            2 => RoadClass::Primary,
            3 => RoadClass::Secondary,
            4 => RoadClass::Tertiary,
            5 => RoadClass::Residential,
            6 => RoadClass::Service,
            _ => RoadClass::Other,
        }
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoadClass::Motorway    => "motorway",
            RoadClass::Trunk       => "trunk",
            RoadClass::Primary     => "primary",
            RoadClass::Secondary   => "secondary",
            RoadClass::Tertiary    => "tertiary",
            RoadClass::Residential => "residential",
            RoadClass::Service     => "service",
            RoadClass::Other       => "other",
        };
        f.write_str(s)
    }
}

// ── NodeType ──────────────────────────────────────────────────────────────────

/// What a graph node physically is.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum NodeType {
    #[default]
    StreetIntersection = 0,
    Gate               = 1,
    Bollard            = 2,
    TollBooth          = 3,
    MotorwayJunction   = 4,
    BorderControl      = 5,
}

impl NodeType {
    pub fn from_bits(v: u8) -> Self {
        match v {
            1 => NodeType::Gate,
            2 => NodeType::Bollard,
            3 => NodeType::TollBooth,
            4 => NodeType::MotorwayJunction,
            5 => NodeType::BorderControl,
            _ => NodeType::StreetIntersection,
        }
    }
}

// ── Access mask ───────────────────────────────────────────────────────────────

/// Bit flags for the per-node access mask.
pub mod access {
    pub const AUTO:       u16 = 1 << 0;
    pub const PEDESTRIAN: u16 = 1 << 1;
    pub const BICYCLE:    u16 = 1 << 2;
    pub const TRUCK:      u16 = 1 << 3;
    pub const EMERGENCY:  u16 = 1 << 4;
    pub const TAXI:       u16 = 1 << 5;
    pub const BUS:        u16 = 1 << 6;
    pub const HOV:        u16 = 1 << 7;

    /// Every mode allowed — the default for untagged nodes.
    pub const ALL: u16 = AUTO | PEDESTRIAN | BICYCLE | TRUCK | EMERGENCY | TAXI | BUS | HOV;
}
