//! Link (ramp) reclassification.
//!
//! A ramp should be at least as important as the better of the two roads it
//! connects.  Every link edge at a junction (a node with both link and
//! non-link edges) starts its own chain.  The chain is walked breadth-first,
//! following link edges only, until nodes with non-link edges are reached.
//! Every chain edge then gets the best class found at the junction and at
//! the chain's far ends.  Sibling ramps sharing a junction are separate
//! chains and never borrow each other's class.
//!
//! The walk is bounded: a chain that is still open more than `max_depth`
//! edges from the junction is left untouched and counted as
//! `link_depth_exceeded`, once per junction edge that tried it.  Edges only ever move to a better class, and the
//! classes seen at chain ends come from non-link edges that this pass never
//! changes, so a second run changes nothing.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use tg_core::{DataQuality, EdgeIndex, GraphId, RoadClass};

use crate::edge::Edge;
use crate::node::Node;
use crate::node_table::NodeTable;
use crate::sequence::{Sequence, SequenceResult};

/// Outcome of one bounded chain walk.
#[derive(Debug, PartialEq, Eq)]
pub enum ChainWalk {
    /// The chain closed within the bound.  `endpoint_class` is the best
    /// non-link class over the far ends, `None` if no far end was found.
    Complete {
        edges: Vec<EdgeIndex>,
        endpoint_class: Option<RoadClass>,
    },
    /// The chain ran past the depth bound.
    Bounded,
}

/// Best (numerically smallest) class over `node`'s non-link edges, or
/// [`RoadClass::Other`] if it has none.
pub fn best_non_link_class(node: &Node, edges: &mut Sequence<Edge>) -> SequenceResult<RoadClass> {
    let mut best = RoadClass::Other;
    for &index in &node.edges {
        let edge = edges.get(index.index())?;
        if !edge.attributes.link {
            best = best.min(edge.attributes.importance);
        }
    }
    Ok(best)
}

/// Walk the link chain that leaves `junction` through the link edge `first`.
pub fn walk_chain(
    junction: GraphId,
    first: EdgeIndex,
    nodes: &NodeTable,
    edges: &mut Sequence<Edge>,
    max_depth: usize,
) -> SequenceResult<ChainWalk> {
    let mut queue: VecDeque<(EdgeIndex, GraphId, usize)> = VecDeque::new();
    let mut seen_edges: FxHashSet<EdgeIndex> = FxHashSet::default();
    let mut seen_nodes: FxHashSet<GraphId> = FxHashSet::default();
    let mut chain = Vec::new();
    let mut endpoint_class: Option<RoadClass> = None;

    seen_nodes.insert(junction);
    queue.push_back((first, junction, 1));

    while let Some((index, from, depth)) = queue.pop_front() {
        if !seen_edges.insert(index) {
            continue;
        }
        if depth > max_depth {
            return Ok(ChainWalk::Bounded);
        }
        chain.push(index);

        let edge = edges.get(index.index())?;
        let next = edge.other_end(from);
        if !seen_nodes.insert(next) {
            continue;
        }
        let Some(node) = nodes.get(next) else { continue };
        if node.attributes.non_link_edge {
            let class = best_non_link_class(node, edges)?;
            endpoint_class = Some(endpoint_class.map_or(class, |c| c.min(class)));
        } else {
            push_links(node, next, depth + 1, edges, &seen_edges, &mut queue)?;
        }
    }
    Ok(ChainWalk::Complete { edges: chain, endpoint_class })
}

fn push_links(
    node: &Node,
    id: GraphId,
    depth: usize,
    edges: &mut Sequence<Edge>,
    seen: &FxHashSet<EdgeIndex>,
    queue: &mut VecDeque<(EdgeIndex, GraphId, usize)>,
) -> SequenceResult<()> {
    for &index in &node.edges {
        if seen.contains(&index) {
            continue;
        }
        if edges.get(index.index())?.attributes.link {
            queue.push_back((index, id, depth));
        }
    }
    Ok(())
}

/// Reclassify every link chain in the graph.  Returns the number of edge
/// updates made.
pub fn reclassify_links(
    nodes: &NodeTable,
    edges: &mut Sequence<Edge>,
    max_depth: usize,
    quality: &mut DataQuality,
) -> SequenceResult<u64> {
    let mut changed = 0u64;
    let mut junctions = 0usize;

    for (id, node) in nodes.iter() {
        if !node.attributes.is_junction() {
            continue;
        }
        junctions += 1;
        let start_class = best_non_link_class(node, edges)?;

        for &first in &node.edges {
            if !edges.get(first.index())?.attributes.link {
                continue;
            }
            let (chain, endpoint_class) = match walk_chain(id, first, nodes, edges, max_depth)? {
                ChainWalk::Bounded => {
                    quality.link_depth_exceeded += 1;
                    warn!(node = %id, osm_id = node.osm_id, edge = first.0, max_depth, "link chain exceeds depth bound, left unchanged");
                    continue;
                }
                ChainWalk::Complete { edges, endpoint_class } => (edges, endpoint_class),
            };
            let Some(endpoint_class) = endpoint_class else {
                debug!(node = %id, edge = first.0, "link chain has no far end");
                continue;
            };

            let class = start_class.min(endpoint_class);
            for index in chain {
                let mut edge = edges.get(index.index())?;
                if class < edge.attributes.importance {
                    edge.attributes.importance = class;
                    edges.update(index.index(), &edge)?;
                    changed += 1;
                }
            }
        }
    }

    quality.links_reclassified += changed;
    info!(junctions, changed, "link reclassification finished");
    Ok(changed)
}
