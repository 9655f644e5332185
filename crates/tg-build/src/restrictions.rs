//! Turn restrictions rewritten into graph-id space.

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use tg_core::{DataQuality, GraphId, TileId};
use tg_osm::{OsmId, OsmRestriction, RestrictionKind};

/// A turn restriction over graph nodes: `[from, via…, to]`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Restriction {
    pub kind: RestrictionKind,
    pub nodes: Vec<GraphId>,
    pub from_way: OsmId,
    pub to_way: OsmId,
}

impl Restriction {
    /// Node the restriction is filed under: the first via node.
    /// [`rewrite_restrictions`] only emits restrictions with at least two
    /// nodes, so this is `None` only for hand-built values.
    pub fn anchor(&self) -> Option<GraphId> {
        self.nodes.get(1).copied()
    }

    /// Tile the restriction is written to.
    pub fn tile(&self) -> Option<TileId> {
        self.anchor().map(GraphId::tile_id)
    }
}

/// Translate every restriction through `dedup`.
///
/// A restriction with fewer than two nodes, or with any node that did not
/// become a graph node, is dropped and counted once.
pub fn rewrite_restrictions(
    source: &[OsmRestriction],
    dedup: &FxHashMap<OsmId, GraphId>,
    quality: &mut DataQuality,
) -> Vec<Restriction> {
    let mut out = Vec::with_capacity(source.len());
    for r in source {
        if r.nodes.len() < 2 {
            quality.malformed_restrictions += 1;
            warn!(from_way = r.from_way, to_way = r.to_way, "restriction has fewer than two nodes, dropped");
            continue;
        }
        let nodes: Option<Vec<GraphId>> = r.nodes.iter().map(|id| dedup.get(id).copied()).collect();
        let Some(nodes) = nodes else {
            quality.unmapped_restrictions += 1;
            warn!(from_way = r.from_way, to_way = r.to_way, "restriction node is not a graph node, dropped");
            continue;
        };
        out.push(Restriction { kind: r.kind, nodes, from_way: r.from_way, to_way: r.to_way });
    }
    info!(kept = out.len(), dropped = source.len() - out.len(), "restrictions rewritten");
    out
}
