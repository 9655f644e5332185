//! End-to-end build: construction, metadata rewriting, reclassification,
//! freeze and finalization in one call.

use std::fmt;

use tracing::info;

use tg_core::{BuildConfig, DataQuality};
use tg_osm::OsmData;

use crate::builder::GraphBuilder;
use crate::finalize::{finalize_tiles, TileWriter};
use crate::node_maps::NodeMaps;
use crate::restrictions::rewrite_restrictions;
use crate::BuildResult;

/// Outcome of a completed build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildSummary {
    pub quality: DataQuality,
    pub tiles: usize,
    pub nodes: usize,
    pub edges: usize,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} tiles, {} nodes, {} edges", self.tiles, self.nodes, self.edges)?;
        write!(f, "{}", self.quality)
    }
}

/// Build the tiled graph for `data` and write every tile through `writer`.
///
/// Data defects never fail the build; they are counted in the returned
/// summary.  Errors come only from the edge file, the configuration or the
/// worker pool.
pub fn build_graph<W: TileWriter>(
    data: &OsmData,
    config: &BuildConfig,
    writer: &W,
) -> BuildResult<BuildSummary> {
    let mut quality = DataQuality::default();

    let mut builder = GraphBuilder::new(config)?;
    info!(
        ways = data.ways.len(),
        nodes = data.nodes.len(),
        level = config.level,
        edges_path = %config.edges_path.display(),
        "building graph"
    );
    builder.construct_edges(data, &mut quality)?;

    let maps = NodeMaps::build(data, builder.dedup());
    let restrictions = rewrite_restrictions(&data.restrictions, builder.dedup(), &mut quality);

    builder.reclassify_links(config.max_link_depth, &mut quality)?;
    let signs = builder.assemble_exit_signs(data, &maps, config.ref_policy)?;

    let graph = builder.freeze(maps, restrictions, signs)?;
    let tile_quality = finalize_tiles(&graph, writer, config.threads)?;
    quality.merge(&tile_quality);

    let summary = BuildSummary {
        quality,
        tiles: graph.tile_count(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
    };
    info!(
        tiles = summary.tiles,
        nodes = summary.nodes,
        edges = summary.edges,
        defects = summary.quality.total_defects(),
        "build finished"
    );
    Ok(summary)
}
