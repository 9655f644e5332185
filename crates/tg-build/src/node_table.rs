//! Per-tile node storage.
//!
//! Nodes live in one `Vec` per tile; a node's [`GraphId`] index is its
//! position in that `Vec`, fixed when the node is pushed.  Everything else
//! (the dedup map, edge endpoints) refers to nodes by `GraphId` only.

use std::collections::BTreeMap;

use tg_core::{CoreResult, GraphId, TileId};

use crate::node::Node;

#[derive(Clone, Debug, Default)]
pub struct NodeTable {
    tiles: BTreeMap<TileId, Vec<Node>>,
    len: usize,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` to `tile` and return its new id.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOverflow`](tg_core::CoreError::IndexOverflow) when
    /// the tile already holds the maximum number of nodes.
    pub fn push(&mut self, tile: TileId, node: Node) -> CoreResult<GraphId> {
        let nodes = self.tiles.entry(tile).or_default();
        let index = u32::try_from(nodes.len()).unwrap_or(u32::MAX);
        let id = tile.graph_id(index)?;
        nodes.push(node);
        self.len += 1;
        Ok(id)
    }

    pub fn get(&self, id: GraphId) -> Option<&Node> {
        self.tiles.get(&id.tile_id())?.get(id.index as usize)
    }

    pub fn get_mut(&mut self, id: GraphId) -> Option<&mut Node> {
        self.tiles.get_mut(&id.tile_id())?.get_mut(id.index as usize)
    }

    /// Nodes of one tile, in index order.
    pub fn tile(&self, tile: TileId) -> &[Node] {
        self.tiles.get(&tile).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Occupied tiles in ascending order.
    pub fn tile_ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.keys().copied()
    }

    /// Every node with its id, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (GraphId, &Node)> + '_ {
        self.tiles.iter().flat_map(|(tile, nodes)| {
            nodes.iter().enumerate().map(move |(i, n)| {
                let id = GraphId { level: tile.level, tile: tile.tile, index: i as u32 };
                (id, n)
            })
        })
    }

    /// Total node count.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub(crate) fn into_tiles(self) -> BTreeMap<TileId, Vec<Node>> {
        self.tiles
    }
}
