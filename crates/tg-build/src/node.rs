//! Graph node records.

use tg_core::{EdgeIndex, GeoPoint, NodeType};
use tg_osm::{OsmId, OsmNode};

/// Per-node attribute block.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeAttributes {
    /// At least one incident edge is a link.
    pub link_edge: bool,
    /// At least one incident edge is not a link.
    pub non_link_edge: bool,
    pub has_exit_to: bool,
    pub has_ref: bool,
    pub has_name: bool,
    pub access_mask: u16,
    pub node_type: NodeType,
    pub traffic_signal: bool,
}

impl NodeAttributes {
    /// Where a ramp meets a through road.
    #[inline]
    pub fn is_junction(&self) -> bool {
        self.link_edge && self.non_link_edge
    }

    #[inline]
    pub fn has_exit_info(&self) -> bool {
        self.has_exit_to || self.has_ref || self.has_name
    }
}

/// A graph node: its source point, its incident edges in discovery order and
/// its attributes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub osm_id: OsmId,
    pub pos: GeoPoint,
    pub edges: Vec<EdgeIndex>,
    pub attributes: NodeAttributes,
}

impl Node {
    /// A node with no edges yet, attributes copied from the source record.
    pub fn new(osm_id: OsmId, source: &OsmNode) -> Self {
        Self {
            osm_id,
            pos: source.pos,
            edges: Vec::new(),
            attributes: NodeAttributes {
                access_mask: source.access_mask,
                node_type: source.node_type,
                traffic_signal: source.traffic_signal,
                ..NodeAttributes::default()
            },
        }
    }

    /// Append an incident edge and update the link / non-link flags.
    pub fn add_edge(&mut self, edge: EdgeIndex, link: bool) {
        if link {
            self.attributes.link_edge = true;
        } else {
            self.attributes.non_link_edge = true;
        }
        self.edges.push(edge);
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
