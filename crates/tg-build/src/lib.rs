//! `tg-build` — the graph construction core.
//!
//! Turns parsed map data ([`tg_osm::OsmData`]) into a tiled routing graph:
//! nodes grouped by tile and addressed by [`GraphId`](tg_core::GraphId),
//! directed edge records in a disk-backed sequence, and the rewritten
//! restriction / sign metadata, then writes it tile by tile.
//!
//! # Phases
//!
//! ```text
//! OsmData ─► GraphBuilder::construct_edges      (nodes, edges, dedup map)
//!         ─► NodeMaps::build + rewrite_restrictions
//!         ─► GraphBuilder::reclassify_links      (ramp importance)
//!         ─► GraphBuilder::assemble_exit_signs
//!         ─► GraphBuilder::freeze ─► TiledGraph  (read-only, Sync)
//!         ─► finalize_tiles ─► TileWriter        (parallel, one task per tile)
//! ```
//!
//! Everything up to `freeze` is single-threaded and takes `&mut self`.
//! [`build_graph`] runs the whole sequence.
//!
//! # Crate layout
//!
//! | Module           | Contents                                              |
//! |------------------|-------------------------------------------------------|
//! | [`sequence`]     | `Sequence` / `FrozenSequence` — file-backed records   |
//! | [`edge`]         | `Edge`, `EdgeAttributes` (packed bit layout)          |
//! | [`node`]         | `Node`, `NodeAttributes`                              |
//! | [`node_table`]   | `NodeTable` — per-tile node storage                   |
//! | [`builder`]      | `GraphBuilder` — edge construction                    |
//! | [`reclassify`]   | Link chain reclassification                           |
//! | [`node_maps`]    | `NodeMaps` — ref / exit-to / name by graph id         |
//! | [`restrictions`] | `Restriction`, `rewrite_restrictions`                 |
//! | [`signs`]        | `SignEntry`, `resolve_ref`, `exit_signs`              |
//! | [`graph`]        | `TiledGraph` — the frozen view                        |
//! | [`finalize`]     | `TilePayload`, `TileWriter`, `finalize_tiles`         |
//! | [`pipeline`]     | `build_graph`, `BuildSummary`                         |
//! | [`error`]        | `BuildError`, `BuildResult<T>`                        |

pub mod builder;
pub mod edge;
pub mod error;
pub mod finalize;
pub mod graph;
pub mod node;
pub mod node_maps;
pub mod node_table;
pub mod pipeline;
pub mod reclassify;
pub mod restrictions;
pub mod sequence;
pub mod signs;

#[cfg(test)]
mod tests;

pub use builder::GraphBuilder;
pub use edge::{Edge, EdgeAttributes};
pub use error::{BuildError, BuildResult};
pub use finalize::{assemble_tile, finalize_tiles, EdgeSigns, NodeLabels, TileEdge, TileError, TilePayload, TileWriter};
pub use graph::TiledGraph;
pub use node::{Node, NodeAttributes};
pub use node_maps::NodeMaps;
pub use node_table::NodeTable;
pub use pipeline::{build_graph, BuildSummary};
pub use reclassify::{best_non_link_class, reclassify_links, ChainWalk};
pub use restrictions::{rewrite_restrictions, Restriction};
pub use sequence::{FixedRecord, FrozenSequence, Sequence, SequenceError, SequenceResult};
pub use signs::{exit_signs, resolve_ref, SignEntry, SignKind};
