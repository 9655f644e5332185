//! Parallel tile finalization.
//!
//! Each occupied tile is assembled into a [`TilePayload`] and handed to a
//! [`TileWriter`].  Tiles are processed on a dedicated rayon pool; every
//! worker reads only the frozen [`TiledGraph`] and its own tile, and keeps
//! a private [`DataQuality`] that is merged once all tiles are done.
//!
//! A tile that cannot be assembled (a dangling edge index, a shape range
//! outside the shape sequence) or that the writer rejects or panics on is
//! logged, counted in `tile_failures` and skipped.  Other tiles are
//! unaffected.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use tg_core::{DataQuality, EdgeIndex, GeoPoint, GraphId, TileId};

use crate::edge::Edge;
use crate::graph::TiledGraph;
use crate::node::Node;
use crate::restrictions::Restriction;
use crate::signs::SignEntry;
use crate::{BuildError, BuildResult};

// ── Payload ───────────────────────────────────────────────────────────────────

/// An edge whose source node lies in the tile, with its geometry.
#[derive(Clone, Debug)]
pub struct TileEdge<'a> {
    pub index: EdgeIndex,
    pub edge: Edge,
    /// Source coordinate followed by the edge's run.
    pub shape: &'a [GeoPoint],
    pub length_m: f64,
}

/// Exit text attached to one node of the tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeLabels<'a> {
    pub node: GraphId,
    pub node_ref: Option<&'a str>,
    pub exit_to: Option<&'a str>,
    pub name: Option<&'a str>,
}

/// Sign entries for one edge of the tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeSigns<'a> {
    pub edge: EdgeIndex,
    pub entries: &'a [SignEntry],
}

/// Everything written for one tile.
#[derive(Clone, Debug)]
pub struct TilePayload<'a> {
    pub tile: TileId,
    /// Nodes in index order; `nodes[i]` has id `node_id(i)`.
    pub nodes: &'a [Node],
    /// Edges leaving this tile's nodes, ordered by edge index.
    pub edges: Vec<TileEdge<'a>>,
    pub labels: Vec<NodeLabels<'a>>,
    /// Restrictions anchored at this tile's nodes.
    pub restrictions: &'a [Restriction],
    pub signs: Vec<EdgeSigns<'a>>,
}

impl TilePayload<'_> {
    /// Graph id of `nodes[i]`.
    #[inline]
    pub fn node_id(&self, i: usize) -> GraphId {
        GraphId { level: self.tile.level, tile: self.tile.tile, index: i as u32 }
    }
}

// ── Writer seam ───────────────────────────────────────────────────────────────

/// Serializer for finished tiles.
///
/// Called concurrently from finalizer workers, never twice for the same
/// tile.  Report failures through `Err`.  A panic inside `write_tile` is
/// caught and counted like an error only when the build unwinds on panic;
/// under the release profile (`panic = "abort"`) it ends the process.
pub trait TileWriter: Sync {
    type Error: fmt::Display;

    fn write_tile(&self, tile: &TilePayload<'_>) -> Result<(), Self::Error>;
}

/// Why a tile was skipped.
#[derive(Debug, Error)]
pub enum TileError {
    #[error("edge {0} is not in the edge sequence")]
    MissingEdge(EdgeIndex),

    #[error("edge {edge} shape range ({start}, {count}) lies outside the shape sequence")]
    CorruptShape { edge: EdgeIndex, start: u32, count: u16 },

    #[error("writer failed: {0}")]
    Write(String),

    #[error("writer panicked: {0}")]
    Panicked(String),
}

// ── Assembly ──────────────────────────────────────────────────────────────────

/// Gather the payload for `tile` from the frozen graph.
pub fn assemble_tile(graph: &TiledGraph, tile: TileId) -> Result<TilePayload<'_>, TileError> {
    let nodes = graph.tile_nodes(tile);
    let maps = graph.node_maps();

    let mut owned: Vec<(EdgeIndex, Edge)> = Vec::new();
    let mut labels = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let id = GraphId { level: tile.level, tile: tile.tile, index: i as u32 };
        for &index in &node.edges {
            let edge = graph.edge(index).ok_or(TileError::MissingEdge(index))?;
            if edge.source == id {
                owned.push((index, edge));
            }
        }
        if node.attributes.has_exit_info() || maps.contains(id) {
            labels.push(NodeLabels {
                node: id,
                node_ref: maps.node_ref(id),
                exit_to: maps.exit_to(id),
                name: maps.name(id),
            });
        }
    }
    owned.sort_unstable_by_key(|(index, _)| *index);
    owned.dedup_by_key(|(index, _)| *index);

    let mut edges = Vec::with_capacity(owned.len());
    let mut signs = Vec::new();
    for (index, edge) in owned {
        let shape = graph.edge_shape(&edge).ok_or(TileError::CorruptShape {
            edge: index,
            start: edge.shape_index,
            count: edge.attributes.shape_count,
        })?;
        if let Some(entries) = graph.signs(index) {
            signs.push(EdgeSigns { edge: index, entries });
        }
        edges.push(TileEdge { index, edge, shape, length_m: GeoPoint::polyline_length_m(shape) });
    }

    Ok(TilePayload {
        tile,
        nodes,
        edges,
        labels,
        restrictions: graph.tile_restrictions(tile),
        signs,
    })
}

// ── Finalization ──────────────────────────────────────────────────────────────

/// Assemble and write every tile of `graph` on a pool of `threads` workers
/// (`None` = one per logical core).  Returns the merged per-worker counters.
///
/// # Errors
///
/// Only [`BuildError::ThreadPool`] if the pool cannot be started.  Tile
/// failures are counted, not returned.
pub fn finalize_tiles<W: TileWriter>(
    graph: &TiledGraph,
    writer: &W,
    threads: Option<usize>,
) -> BuildResult<DataQuality> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .build()
        .map_err(|e| BuildError::ThreadPool(e.to_string()))?;
    let tiles: Vec<TileId> = graph.tile_ids().collect();

    let quality = pool.install(|| {
        tiles
            .par_iter()
            .fold(DataQuality::default, |mut quality, &tile| {
                finalize_tile(graph, writer, tile, &mut quality);
                quality
            })
            .reduce(DataQuality::default, |mut a, b| {
                a.merge(&b);
                a
            })
    });

    info!(
        tiles = tiles.len(),
        written = quality.tiles_written,
        failed = quality.tile_failures,
        threads = pool.current_num_threads(),
        "tile finalization finished"
    );
    Ok(quality)
}

fn finalize_tile<W: TileWriter>(graph: &TiledGraph, writer: &W, tile: TileId, quality: &mut DataQuality) {
    let result = assemble_tile(graph, tile).and_then(|payload| {
        catch_unwind(AssertUnwindSafe(|| writer.write_tile(&payload)))
            .map_err(|panic| TileError::Panicked(panic_message(panic.as_ref())))?
            .map_err(|e| TileError::Write(e.to_string()))?;
        Ok((payload.nodes.len(), payload.edges.len()))
    });
    match result {
        Ok((nodes, edges)) => {
            quality.tiles_written += 1;
            debug!(tile = %tile, nodes, edges, "tile written");
        }
        Err(e) => {
            quality.tile_failures += 1;
            warn!(tile = %tile, error = %e, "tile failed, skipped");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
