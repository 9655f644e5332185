//! OSM PBF loader — enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use tg_osm::osm::load_from_pbf;
//!
//! let data = load_from_pbf(Path::new("mobile_al.osm.pbf"))?;
//! ```
//!
//! # What is loaded
//!
//! - Drivable `highway=*` ways (see [`tags::road_class`]) with their
//!   direction and link flags and the tags used for exit signage.
//! - Every node those ways reference, with node type, access mask and
//!   traffic-signal attributes.
//! - `ref` / `exit_to` / `name` of motorway junctions into the sparse maps.
//! - `type=restriction` relations with a single via node, turned into a
//!   `[from, via, to]` node sequence.
//! - Route relation refs (`type=route`, `route=road`), attached to member
//!   ways as `relation_ref` with the member role as a direction suffix.
//!
//! # Memory note
//!
//! All nodes are buffered for the single sequential pass (ways reference
//! nodes by id).  Nodes not referenced by a drivable way are dropped before
//! returning.

use std::collections::BTreeMap;
use std::path::Path;

use osmpbf::{Element, ElementReader, RelMemberType};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use tg_core::GeoPoint;

use crate::data::{OsmData, OsmId, OsmNode, OsmRestriction, OsmWay, RestrictionKind};
use crate::{tags, OsmError, OsmResult};

/// Way tags kept for signage.
const SIGN_TAGS: [&str; 6] = [
    "name",
    "ref",
    "destination",
    "destination:ref",
    "destination:street",
    "junction:ref",
];

// ── Public entry point ────────────────────────────────────────────────────────

/// Load drivable ways, their nodes, exit metadata and turn restrictions from
/// an OSM PBF file.
///
/// # Errors
///
/// Returns [`OsmError::Osm`] on open or parse errors.
pub fn load_from_pbf(path: &Path) -> OsmResult<OsmData> {
    let reader = ElementReader::from_path(path).map_err(|e| OsmError::Osm(e.to_string()))?;

    let mut data = OsmData::new();
    let mut raw_restrictions: Vec<RawRestriction> = Vec::new();
    let mut way_relation_refs: FxHashMap<OsmId, Vec<String>> = FxHashMap::default();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                let t: Vec<(&str, &str)> = n.tags().collect();
                add_node(&mut data, n.id(), GeoPoint::new(n.lat(), n.lon()), &t);
            }
            Element::DenseNode(n) => {
                let t: Vec<(&str, &str)> = n.tags().collect();
                add_node(&mut data, n.id(), GeoPoint::new(n.lat(), n.lon()), &t);
            }
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let t: Vec<(&str, &str)> = w.tags().collect();
                if let Some(way) = make_way(w.id(), w.refs().collect(), &t) {
                    data.add_way(way);
                }
            }
            Element::Relation(r) => {
                let t: Vec<(&str, &str)> = r.tags().collect();
                let get = |key: &str| t.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
                match get("type") {
                    Some("restriction") => {
                        let kind = get("restriction")
                            .or_else(|| get("restriction:motorcar"))
                            .and_then(RestrictionKind::from_tag);
                        let Some(kind) = kind else { return };
                        let mut raw = RawRestriction { kind, from: None, via: None, to: None };
                        for m in r.members() {
                            match (m.role().unwrap_or(""), m.member_type) {
                                ("from", RelMemberType::Way)  => raw.from = Some(m.member_id),
                                ("via",  RelMemberType::Node) => raw.via = Some(m.member_id),
                                ("to",   RelMemberType::Way)  => raw.to = Some(m.member_id),
                                _ => {}
                            }
                        }
                        raw_restrictions.push(raw);
                    }
                    Some("route") if get("route") == Some("road") => {
                        let Some(route_ref) = get("ref") else { return };
                        for m in r.members() {
                            if m.member_type != RelMemberType::Way {
                                continue;
                            }
                            let text = match m.role().unwrap_or("") {
                                role @ ("north" | "south" | "east" | "west") => {
                                    format!("{route_ref} {}", capitalize(role))
                                }
                                _ => route_ref.to_owned(),
                            };
                            way_relation_refs.entry(m.member_id).or_default().push(text);
                        }
                    }
                    _ => {}
                }
            }
        })
        .map_err(|e| OsmError::Osm(e.to_string()))?;

    // ── Attach relation refs ──────────────────────────────────────────────
    for way in &mut data.ways {
        if let Some(refs) = way_relation_refs.remove(&way.id) {
            way.relation_ref = Some(refs.join(";"));
        }
    }

    // ── Drop nodes no drivable way references ─────────────────────────────
    let road_node_ids: FxHashSet<OsmId> = data
        .ways
        .iter()
        .flat_map(|w| w.nodes.iter().copied())
        .collect();
    data.nodes.retain(|id, _| road_node_ids.contains(id));
    data.node_ref.retain(|id, _| road_node_ids.contains(id));
    data.node_exit_to.retain(|id, _| road_node_ids.contains(id));
    data.node_name.retain(|id, _| road_node_ids.contains(id));

    // ── Resolve restrictions to node sequences ────────────────────────────
    let way_nodes: FxHashMap<OsmId, &[OsmId]> =
        data.ways.iter().map(|w| (w.id, w.nodes.as_slice())).collect();
    let restrictions: Vec<OsmRestriction> = raw_restrictions
        .iter()
        .filter_map(|r| r.resolve(&way_nodes))
        .collect();
    drop(way_nodes);
    data.restrictions = restrictions;

    info!(
        nodes = data.nodes.len(),
        ways = data.ways.len(),
        restrictions = data.restrictions.len(),
        "loaded OSM extract"
    );
    Ok(data)
}

// ── Internal types ────────────────────────────────────────────────────────────

struct RawRestriction {
    kind: RestrictionKind,
    from: Option<OsmId>,
    via:  Option<OsmId>,
    to:   Option<OsmId>,
}

impl RawRestriction {
    /// Turn from-way / via-node / to-way into `[from, via, to]` node ids.
    ///
    /// The from node is the from-way's neighbour of the via node, the to node
    /// the to-way's neighbour.  Restrictions whose ways were not loaded or do
    /// not touch the via node are skipped.
    fn resolve(&self, ways: &FxHashMap<OsmId, &[OsmId]>) -> Option<OsmRestriction> {
        let (from_way, via, to_way) = (self.from?, self.via?, self.to?);
        let from = neighbour(ways.get(&from_way)?, via, true)?;
        let to = neighbour(ways.get(&to_way)?, via, false)?;
        Some(OsmRestriction {
            kind: self.kind,
            nodes: vec![from, via, to],
            from_way,
            to_way,
        })
    }
}

/// The node adjacent to `via` on `nodes`.  When `via` is interior, the
/// previous node is chosen for the approach (`before == true`) and the next
/// node for the exit.
fn neighbour(nodes: &[OsmId], via: OsmId, before: bool) -> Option<OsmId> {
    let pos = nodes.iter().position(|&n| n == via)?;
    let last = nodes.len().checked_sub(1)?;
    let idx = match (pos, before) {
        (0, _) => 1,
        (p, _) if p == last => p.checked_sub(1)?,
        (p, true) => p - 1,
        (p, false) => p + 1,
    };
    nodes.get(idx).copied()
}

// ── Element helpers ───────────────────────────────────────────────────────────

fn add_node(data: &mut OsmData, id: OsmId, pos: GeoPoint, t: &[(&str, &str)]) {
    let mut node = OsmNode::new(pos);
    if !t.is_empty() {
        node.node_type = tags::node_type(t);
        node.access_mask = tags::access_mask(t);
        if tags::is_traffic_signal(t) {
            node = node.with_signal(tags::signal_direction(t));
        }
        if node.node_type == tg_core::NodeType::MotorwayJunction {
            for (key, value) in t {
                match *key {
                    "ref"     => { data.node_ref.insert(id, (*value).to_owned()); }
                    "exit_to" => { data.node_exit_to.insert(id, (*value).to_owned()); }
                    "name"    => { data.node_name.insert(id, (*value).to_owned()); }
                    _ => {}
                }
            }
        }
    }
    data.add_node(id, node);
}

fn make_way(id: OsmId, refs: Vec<OsmId>, t: &[(&str, &str)]) -> Option<OsmWay> {
    let highway = t.iter().find(|(k, _)| *k == "highway").map(|(_, v)| *v)?;
    let road_class = tags::road_class(highway)?;
    let (forward, backward) = tags::directions(highway, t);
    let kept: BTreeMap<String, String> = t
        .iter()
        .filter(|(k, _)| SIGN_TAGS.contains(k))
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    Some(OsmWay {
        id,
        nodes: refs,
        road_class,
        forward,
        backward,
        link: tags::is_link(highway),
        relation_ref: None,
        tags: kept,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
