//! Sparse node text keyed by graph id.
//!
//! The parser keys junction ref / exit-to / name text by source node id.
//! Once nodes have graph ids the text is re-keyed; entries for source points
//! that ended up as shape points have nowhere to go and are dropped.

use rustc_hash::FxHashMap;

use tg_core::GraphId;
use tg_osm::{OsmData, OsmId};

#[derive(Clone, Debug, Default)]
pub struct NodeMaps {
    refs:     FxHashMap<GraphId, String>,
    exit_to:  FxHashMap<GraphId, String>,
    names:    FxHashMap<GraphId, String>,
}

impl NodeMaps {
    /// Project `data`'s source-keyed maps through `dedup`.
    pub fn build(data: &OsmData, dedup: &FxHashMap<OsmId, GraphId>) -> Self {
        Self {
            refs:    project(&data.node_ref, dedup),
            exit_to: project(&data.node_exit_to, dedup),
            names:   project(&data.node_name, dedup),
        }
    }

    pub fn node_ref(&self, id: GraphId) -> Option<&str> {
        self.refs.get(&id).map(String::as_str)
    }

    pub fn exit_to(&self, id: GraphId) -> Option<&str> {
        self.exit_to.get(&id).map(String::as_str)
    }

    pub fn name(&self, id: GraphId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// `true` if any of the three maps has an entry for `id`.
    pub fn contains(&self, id: GraphId) -> bool {
        self.refs.contains_key(&id) || self.exit_to.contains_key(&id) || self.names.contains_key(&id)
    }

    /// Total entries over all three maps.
    pub fn len(&self) -> usize {
        self.refs.len() + self.exit_to.len() + self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn project(
    source: &FxHashMap<OsmId, String>,
    dedup: &FxHashMap<OsmId, GraphId>,
) -> FxHashMap<GraphId, String> {
    source
        .iter()
        .filter_map(|(osm, text)| dedup.get(osm).map(|&gid| (gid, text.clone())))
        .collect()
}
