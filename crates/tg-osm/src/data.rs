//! Parsed map-source records.
//!
//! This is the hand-off format between the parser and the graph builder.
//! Ways reference nodes by source id; coordinates live only in the node
//! table.  Exit metadata (ref / exit-to / name) is sparse and held in
//! separate maps so the common node record stays small.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use tg_core::{access, GeoPoint, NodeType, RoadClass};

/// Source (OSM) identifier of a node or way.
pub type OsmId = i64;

// ── OsmNode ───────────────────────────────────────────────────────────────────

/// Which travel direction a traffic signal applies to, relative to the way
/// it sits on.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalDirection {
    #[default]
    Both,
    Forward,
    Backward,
}

/// One source point.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsmNode {
    pub pos: GeoPoint,
    pub access_mask: u16,
    pub node_type: NodeType,
    pub traffic_signal: bool,
    pub signal_direction: SignalDirection,
}

impl OsmNode {
    /// A plain, fully accessible intersection/shape point at `pos`.
    pub fn new(pos: GeoPoint) -> Self {
        Self {
            pos,
            access_mask:      access::ALL,
            node_type:        NodeType::StreetIntersection,
            traffic_signal:   false,
            signal_direction: SignalDirection::Both,
        }
    }

    pub fn with_signal(mut self, direction: SignalDirection) -> Self {
        self.traffic_signal = true;
        self.signal_direction = direction;
        self
    }
}

// ── OsmWay ────────────────────────────────────────────────────────────────────

/// One drivable source way.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsmWay {
    pub id: OsmId,
    /// Ordered node references.  Consecutive repeats are allowed; a closed
    /// way repeats its first node at the end.
    pub nodes: Vec<OsmId>,
    pub road_class: RoadClass,
    /// Drivable in digitised direction.
    pub forward: bool,
    /// Drivable against digitised direction.
    pub backward: bool,
    /// Ramp / connector (`highway=*_link`).
    pub link: bool,
    /// Reference inherited from a route relation the way belongs to.
    pub relation_ref: Option<String>,
    /// Free-form tags kept for signage.
    pub tags: BTreeMap<String, String>,
}

impl OsmWay {
    /// A two-way, non-link way with no tags.
    pub fn new(id: OsmId, nodes: Vec<OsmId>, road_class: RoadClass) -> Self {
        Self {
            id,
            nodes,
            road_class,
            forward:      true,
            backward:     true,
            link:         false,
            relation_ref: None,
            tags:         BTreeMap::new(),
        }
    }

    pub fn oneway(mut self) -> Self {
        self.backward = false;
        self
    }

    pub fn as_link(mut self) -> Self {
        self.link = true;
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn with_relation_ref(mut self, r: &str) -> Self {
        self.relation_ref = Some(r.to_owned());
        self
    }

    /// Value of tag `key`, if present.
    #[inline]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

// ── OsmRestriction ────────────────────────────────────────────────────────────

/// Turn restriction type (`restriction=*`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RestrictionKind {
    NoLeftTurn     = 0,
    NoRightTurn    = 1,
    NoStraightOn   = 2,
    NoUTurn        = 3,
    OnlyRightTurn  = 4,
    OnlyLeftTurn   = 5,
    OnlyStraightOn = 6,
    NoEntry        = 7,
    NoExit         = 8,
}

impl RestrictionKind {
    /// Parse a `restriction=*` value.
    pub fn from_tag(value: &str) -> Option<Self> {
        Some(match value {
            "no_left_turn"     => RestrictionKind::NoLeftTurn,
            "no_right_turn"    => RestrictionKind::NoRightTurn,
            "no_straight_on"   => RestrictionKind::NoStraightOn,
            "no_u_turn"        => RestrictionKind::NoUTurn,
            "only_right_turn"  => RestrictionKind::OnlyRightTurn,
            "only_left_turn"   => RestrictionKind::OnlyLeftTurn,
            "only_straight_on" => RestrictionKind::OnlyStraightOn,
            "no_entry"         => RestrictionKind::NoEntry,
            "no_exit"          => RestrictionKind::NoExit,
            _                  => return None,
        })
    }
}

/// A relation-scoped turn restriction described by source node ids:
/// `[from, via…, to]`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsmRestriction {
    pub kind: RestrictionKind,
    pub nodes: Vec<OsmId>,
    pub from_way: OsmId,
    pub to_way: OsmId,
}

// ── OsmData ───────────────────────────────────────────────────────────────────

/// Everything the graph builder consumes from the parser.
#[derive(Clone, Debug, Default)]
pub struct OsmData {
    /// Every node referenced by a way (and possibly more).
    pub nodes: FxHashMap<OsmId, OsmNode>,
    /// Drivable ways in parse order.  A way's position is its way index.
    pub ways: Vec<OsmWay>,
    pub restrictions: Vec<OsmRestriction>,

    // ── Sparse exit metadata ──────────────────────────────────────────────
    /// Junction reference numbers (`ref` on `highway=motorway_junction`).
    pub node_ref: FxHashMap<OsmId, String>,
    /// `exit_to` text.
    pub node_exit_to: FxHashMap<OsmId, String>,
    /// Junction names.
    pub node_name: FxHashMap<OsmId, String>,
}

impl OsmData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: OsmId, node: OsmNode) {
        self.nodes.insert(id, node);
    }

    pub fn add_way(&mut self, way: OsmWay) {
        self.ways.push(way);
    }
}

/// Number of times each node id is referenced across `ways`.
///
/// A node repeated within one way counts once per occurrence, so a way
/// that crosses itself produces a graph node at the crossing.
pub fn reference_counts<'a>(ways: impl IntoIterator<Item = &'a OsmWay>) -> FxHashMap<OsmId, u32> {
    let mut counts: FxHashMap<OsmId, u32> = FxHashMap::default();
    for way in ways {
        for &id in &way.nodes {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    counts
}
