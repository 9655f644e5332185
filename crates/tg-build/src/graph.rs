//! The frozen, read-only graph handed to tile finalization.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use tg_core::{EdgeIndex, GeoPoint, GraphId, TileId, TileLevel};

use crate::edge::Edge;
use crate::node::Node;
use crate::node_maps::NodeMaps;
use crate::node_table::NodeTable;
use crate::restrictions::Restriction;
use crate::sequence::FrozenSequence;
use crate::signs::SignEntry;

/// Immutable graph produced by [`GraphBuilder::freeze`](crate::GraphBuilder::freeze).
///
/// Nothing here can be mutated, so a `&TiledGraph` is shared freely across
/// finalizer workers.  The edge sequence is a read-only memory map.
pub struct TiledGraph {
    level:        TileLevel,
    tiles:        BTreeMap<TileId, Vec<Node>>,
    edges:        FrozenSequence<Edge>,
    shapes:       Vec<GeoPoint>,
    maps:         NodeMaps,
    restrictions: FxHashMap<TileId, Vec<Restriction>>,
    signs:        FxHashMap<EdgeIndex, Vec<SignEntry>>,
}

impl TiledGraph {
    pub(crate) fn new(
        level: TileLevel,
        nodes: NodeTable,
        edges: FrozenSequence<Edge>,
        shapes: Vec<GeoPoint>,
        maps: NodeMaps,
        restrictions: Vec<Restriction>,
        signs: FxHashMap<EdgeIndex, Vec<SignEntry>>,
    ) -> Self {
        let mut by_tile: FxHashMap<TileId, Vec<Restriction>> = FxHashMap::default();
        for r in restrictions {
            if let Some(tile) = r.tile() {
                by_tile.entry(tile).or_default().push(r);
            }
        }
        Self {
            level,
            tiles: nodes.into_tiles(),
            edges,
            shapes,
            maps,
            restrictions: by_tile,
            signs,
        }
    }

    pub fn level(&self) -> &TileLevel {
        &self.level
    }

    /// Occupied tiles in ascending order.
    pub fn tile_ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.keys().copied()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Nodes of `tile` in index order.
    pub fn tile_nodes(&self, tile: TileId) -> &[Node] {
        self.tiles.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node(&self, id: GraphId) -> Option<&Node> {
        self.tiles.get(&id.tile_id())?.get(id.index as usize)
    }

    pub fn node_count(&self) -> usize {
        self.tiles.values().map(Vec::len).sum()
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<Edge> {
        self.edges.get(index.index())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in sequence order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter()
    }

    /// Full geometry of `edge`: source coordinate followed by its run.
    /// `None` if the edge's shape range lies outside the shape sequence.
    pub fn edge_shape(&self, edge: &Edge) -> Option<&[GeoPoint]> {
        let first = (edge.shape_index as usize).checked_sub(1)?;
        let end = edge.shape_index as usize + edge.attributes.shape_count as usize;
        self.shapes.get(first..end)
    }

    pub fn shapes(&self) -> &[GeoPoint] {
        &self.shapes
    }

    pub fn node_maps(&self) -> &NodeMaps {
        &self.maps
    }

    /// Restrictions anchored in `tile`.
    pub fn tile_restrictions(&self, tile: TileId) -> &[Restriction] {
        self.restrictions.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn signs(&self, index: EdgeIndex) -> Option<&[SignEntry]> {
        self.signs.get(&index).map(Vec::as_slice)
    }
}
