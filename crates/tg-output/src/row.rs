//! Plain data rows extracted from a tile payload.
//!
//! Rows own their data so they outlive the payload they came from.

use tg_core::{EdgeIndex, GeoPoint, GraphId, NodeType, RoadClass, TileId};
use tg_build::{SignKind, TilePayload};
use tg_osm::{OsmId, RestrictionKind};

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id:             GraphId,
    pub osm_id:         OsmId,
    pub pos:            GeoPoint,
    pub edge_count:     usize,
    pub node_type:      NodeType,
    pub access_mask:    u16,
    pub traffic_signal: bool,
    pub link_edge:      bool,
    pub non_link_edge:  bool,
    pub node_ref:       Option<String>,
    pub exit_to:        Option<String>,
    pub name:           Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub index:          EdgeIndex,
    pub source:         GraphId,
    pub target:         GraphId,
    pub way_index:      u32,
    pub importance:     RoadClass,
    pub forward:        bool,
    pub reverse:        bool,
    pub link:           bool,
    pub traffic_signal: bool,
    pub shape_count:    u16,
    pub length_m:       f64,
    /// Source coordinate followed by the edge's run.
    pub shape:          Vec<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRow {
    pub edge: EdgeIndex,
    pub kind: SignKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionRow {
    pub kind:     RestrictionKind,
    pub nodes:    Vec<GraphId>,
    pub from_way: OsmId,
    pub to_way:   OsmId,
}

/// Every row of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRows {
    pub tile:         TileId,
    pub nodes:        Vec<NodeRow>,
    pub edges:        Vec<EdgeRow>,
    pub signs:        Vec<SignRow>,
    pub restrictions: Vec<RestrictionRow>,
}

impl TileRows {
    pub fn from_payload(payload: &TilePayload<'_>) -> Self {
        let mut nodes: Vec<NodeRow> = payload
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| NodeRow {
                id:             payload.node_id(i),
                osm_id:         n.osm_id,
                pos:            n.pos,
                edge_count:     n.edge_count(),
                node_type:      n.attributes.node_type,
                access_mask:    n.attributes.access_mask,
                traffic_signal: n.attributes.traffic_signal,
                link_edge:      n.attributes.link_edge,
                non_link_edge:  n.attributes.non_link_edge,
                node_ref:       None,
                exit_to:        None,
                name:           None,
            })
            .collect();
        for label in &payload.labels {
            if let Some(row) = nodes.get_mut(label.node.index as usize) {
                row.node_ref = label.node_ref.map(str::to_owned);
                row.exit_to = label.exit_to.map(str::to_owned);
                row.name = label.name.map(str::to_owned);
            }
        }

        let edges = payload
            .edges
            .iter()
            .map(|e| {
                let a = e.edge.attributes;
                EdgeRow {
                    index:          e.index,
                    source:         e.edge.source,
                    target:         e.edge.target,
                    way_index:      e.edge.way_index.0,
                    importance:     a.importance,
                    forward:        a.forward,
                    reverse:        a.reverse,
                    link:           a.link,
                    traffic_signal: a.traffic_signal,
                    shape_count:    a.shape_count,
                    length_m:       e.length_m,
                    shape:          e.shape.to_vec(),
                }
            })
            .collect();

        let signs = payload
            .signs
            .iter()
            .flat_map(|s| {
                s.entries.iter().map(move |entry| SignRow {
                    edge: s.edge,
                    kind: entry.kind,
                    text: entry.text.clone(),
                })
            })
            .collect();

        let restrictions = payload
            .restrictions
            .iter()
            .map(|r| RestrictionRow {
                kind:     r.kind,
                nodes:    r.nodes.clone(),
                from_way: r.from_way,
                to_way:   r.to_way,
            })
            .collect();

        Self { tile: payload.tile, nodes, edges, signs, restrictions }
    }
}
