//! The builder-phase graph: edge construction and the mutable view.
//!
//! [`GraphBuilder`] owns everything that grows while ways are walked:
//!
//! - the per-tile [`NodeTable`],
//! - the disk-backed edge [`Sequence`],
//! - the dedup map (source node id → [`GraphId`]),
//! - the shared shape coordinate sequence.
//!
//! It is single-threaded by construction (`&mut self` everywhere).  When
//! construction and the metadata passes are done, [`GraphBuilder::freeze`]
//! consumes it and returns the immutable [`TiledGraph`].

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use tg_core::{
    BuildConfig, DataQuality, EdgeIndex, GeoPoint, GraphId, RefPolicy, TileLevel, WayIndex,
};
use tg_osm::{reference_counts, OsmData, OsmId, OsmNode, OsmWay};

use crate::edge::Edge;
use crate::graph::TiledGraph;
use crate::node::Node;
use crate::node_maps::NodeMaps;
use crate::node_table::NodeTable;
use crate::reclassify;
use crate::restrictions::Restriction;
use crate::sequence::Sequence;
use crate::signs::{self, SignEntry};
use crate::{BuildError, BuildResult};

/// Why a way was skipped.
enum WayDefect {
    TooShort,
    MissingNode(OsmId),
    BadCoordinate(OsmId),
}

pub struct GraphBuilder {
    level:  TileLevel,
    nodes:  NodeTable,
    edges:  Sequence<Edge>,
    dedup:  FxHashMap<OsmId, GraphId>,
    shapes: Vec<GeoPoint>,
}

impl GraphBuilder {
    /// Validate `config` and create the edge file at `config.edges_path`.
    pub fn new(config: &BuildConfig) -> BuildResult<Self> {
        config.validate()?;
        let level = config.build_level()?.clone();
        let edges = Sequence::create(&config.edges_path)?;
        Ok(Self {
            level,
            nodes: NodeTable::new(),
            edges,
            dedup: FxHashMap::default(),
            shapes: Vec::new(),
        })
    }

    // ── Edge construction ─────────────────────────────────────────────────

    /// Walk every way of `data` and emit nodes and edges.
    ///
    /// A way endpoint is always a node.  An interior point is a node when it
    /// is referenced more than once across the accepted ways; otherwise it
    /// becomes a shape point of the surrounding edge.  Invalid ways are
    /// counted in `quality` and skipped whole, and do not promote the points
    /// they share with accepted ways.
    pub fn construct_edges(
        &mut self,
        data: &OsmData,
        quality: &mut DataQuality,
    ) -> BuildResult<()> {
        let mut accepted = Vec::with_capacity(data.ways.len());
        for (i, way) in data.ways.iter().enumerate() {
            let way_index = WayIndex::try_from(i)
                .map_err(|_| BuildError::Overflow { what: "way index" })?;
            match validate_way(way, data, &self.level) {
                Ok(records) => accepted.push((way_index, way, records)),
                Err(defect) => record_defect(way, defect, quality),
            }
        }

        let counts = reference_counts(accepted.iter().map(|(_, way, _)| *way));
        for (way_index, way, records) in &accepted {
            self.add_way(*way_index, way, records, data, &counts, quality)?;
            quality.ways_processed += 1;
        }
        info!(
            ways = quality.ways_processed,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            tiles = self.nodes.tile_count(),
            "edge construction finished"
        );
        Ok(())
    }

    fn add_way(
        &mut self,
        way_index: WayIndex,
        way: &OsmWay,
        records: &[&OsmNode],
        data: &OsmData,
        counts: &FxHashMap<OsmId, u32>,
        quality: &mut DataQuality,
    ) -> BuildResult<()> {
        let shape_base = self.shapes.len();
        self.shapes.extend(records.iter().map(|r| r.pos));

        let last = way.nodes.len() - 1;
        let mut start = self.resolve_node(way.nodes[0], records[0], data, quality)?;
        let mut run_start = 0;
        let mut signals = Vec::new();

        for i in 1..=last {
            let (id, record) = (way.nodes[i], records[i]);
            let run_len = i - run_start;
            let is_node = i == last
                || counts.get(&id).copied().unwrap_or(0) >= 2
                || run_len == u16::MAX as usize;
            if !is_node {
                if record.traffic_signal {
                    signals.push(record.signal_direction);
                }
                continue;
            }

            let end = self.resolve_node(id, record, data, quality)?;
            let shape_index = u32::try_from(shape_base + run_start + 1)
                .map_err(|_| BuildError::Overflow { what: "shape index" })?;
            let mut edge = Edge::new(start, end, way_index, shape_index, run_len as u16, way);
            for direction in signals.drain(..) {
                edge.mark_signal(direction);
            }
            let index = EdgeIndex::try_from(self.edges.append(&edge)?)
                .map_err(|_| BuildError::Overflow { what: "edge index" })?;
            self.attach(start, index, way.link);
            if end != start {
                self.attach(end, index, way.link);
            }
            quality.edges_created += 1;

            start = end;
            run_start = i;
        }
        Ok(())
    }

    /// The node for source id `id`, creating it on first sight.
    fn resolve_node(
        &mut self,
        id: OsmId,
        record: &OsmNode,
        data: &OsmData,
        quality: &mut DataQuality,
    ) -> BuildResult<GraphId> {
        if let Some(&gid) = self.dedup.get(&id) {
            return Ok(gid);
        }
        let tile = self.level.tile_for(record.pos)?;
        let mut node = Node::new(id, record);
        node.attributes.has_ref = data.node_ref.contains_key(&id);
        node.attributes.has_exit_to = data.node_exit_to.contains_key(&id);
        node.attributes.has_name = data.node_name.contains_key(&id);
        let gid = self.nodes.push(tile, node)?;
        self.dedup.insert(id, gid);
        quality.nodes_created += 1;
        Ok(gid)
    }

    fn attach(&mut self, node: GraphId, edge: EdgeIndex, link: bool) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.add_edge(edge, link);
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Graph id assigned to source node `id`, if it became a node.
    pub fn graph_id(&self, id: OsmId) -> Option<GraphId> {
        self.dedup.get(&id).copied()
    }

    /// The dedup map.
    pub fn dedup(&self) -> &FxHashMap<OsmId, GraphId> {
        &self.dedup
    }

    pub fn node(&self, id: GraphId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// Read edge `index` from the edge sequence.
    pub fn edge(&mut self, index: EdgeIndex) -> BuildResult<Edge> {
        Ok(self.edges.get(index.index())?)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn shapes(&self) -> &[GeoPoint] {
        &self.shapes
    }

    pub fn level(&self) -> &TileLevel {
        &self.level
    }

    // ── Post-construction passes ──────────────────────────────────────────

    /// Run the link reclassifier over the whole graph.  Returns the number of
    /// edges whose importance changed.
    pub fn reclassify_links(
        &mut self,
        max_depth: usize,
        quality: &mut DataQuality,
    ) -> BuildResult<u64> {
        Ok(reclassify::reclassify_links(&self.nodes, &mut self.edges, max_depth, quality)?)
    }

    /// Exit signs for link edges leaving junction and exit nodes, keyed by
    /// edge index.
    pub fn assemble_exit_signs(
        &mut self,
        data: &OsmData,
        maps: &NodeMaps,
        policy: RefPolicy,
    ) -> BuildResult<FxHashMap<EdgeIndex, Vec<SignEntry>>> {
        let mut out: FxHashMap<EdgeIndex, Vec<SignEntry>> = FxHashMap::default();
        let mut seen: FxHashSet<EdgeIndex> = FxHashSet::default();
        for (id, node) in self.nodes.iter() {
            if !(node.attributes.is_junction() || node.attributes.has_exit_info()) {
                continue;
            }
            for &index in &node.edges {
                let edge = self.edges.get(index.index())?;
                if !edge.attributes.link || !edge.leaves(id) || !seen.insert(index) {
                    continue;
                }
                let Some(way) = data.ways.get(edge.way_index.index()) else { continue };
                let entries = signs::exit_signs(way, id, maps, policy);
                if !entries.is_empty() {
                    out.insert(index, entries);
                }
            }
        }
        info!(edges = out.len(), "exit signs assembled");
        Ok(out)
    }

    /// End the builder phase.
    pub fn freeze(
        self,
        maps: NodeMaps,
        restrictions: Vec<Restriction>,
        signs: FxHashMap<EdgeIndex, Vec<SignEntry>>,
    ) -> BuildResult<TiledGraph> {
        let edges = self.edges.freeze()?;
        Ok(TiledGraph::new(
            self.level,
            self.nodes,
            edges,
            self.shapes,
            maps,
            restrictions,
            signs,
        ))
    }
}

// ── Way validation ────────────────────────────────────────────────────────────

/// Resolve every node record of `way`, or say why the way must be skipped.
fn validate_way<'a>(
    way: &OsmWay,
    data: &'a OsmData,
    level: &TileLevel,
) -> Result<Vec<&'a OsmNode>, WayDefect> {
    if way.nodes.len() < 2 {
        return Err(WayDefect::TooShort);
    }
    way.nodes
        .iter()
        .map(|&id| -> Result<&'a OsmNode, WayDefect> {
            let record = data.nodes.get(&id).ok_or(WayDefect::MissingNode(id))?;
            level.tile_for(record.pos).map_err(|_| WayDefect::BadCoordinate(id))?;
            Ok(record)
        })
        .collect()
}

fn record_defect(way: &OsmWay, defect: WayDefect, quality: &mut DataQuality) {
    match defect {
        WayDefect::TooShort => {
            quality.ways_too_short += 1;
            warn!(way = way.id, refs = way.nodes.len(), "way has fewer than two nodes, skipped");
        }
        WayDefect::MissingNode(node) => {
            quality.missing_nodes += 1;
            warn!(way = way.id, node, "way references a missing node, skipped");
        }
        WayDefect::BadCoordinate(node) => {
            quality.bad_coordinates += 1;
            warn!(way = way.id, node, "way has a node outside the tileable range, skipped");
        }
    }
}
