//! Exit sign assembly.
//!
//! Signs are attached to link edges leaving a junction or exit node.  Entries
//! come out in a fixed order:
//!
//! | Kind         | Source                                                        |
//! |--------------|---------------------------------------------------------------|
//! | `ExitNumber` | way `junction:ref`, else the node's ref                       |
//! | `ExitBranch` | way `destination:ref`, else way `ref` (against the relation ref, per policy), then `destination:street` |
//! | `ExitToward` | way `destination`, else the node's exit-to text               |
//! | `ExitName`   | the node's name, else way `name`                              |
//!
//! Text holding several `;`-separated values yields one entry per value.
//! Empty values are skipped.

use std::fmt;

use tg_core::{GraphId, RefPolicy};
use tg_osm::OsmWay;

use crate::node_maps::NodeMaps;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignKind {
    ExitNumber,
    ExitBranch,
    ExitToward,
    ExitName,
}

impl fmt::Display for SignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignKind::ExitNumber => "exit_number",
            SignKind::ExitBranch => "exit_branch",
            SignKind::ExitToward => "exit_toward",
            SignKind::ExitName   => "exit_name",
        })
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignEntry {
    pub kind: SignKind,
    pub text: String,
}

/// Choose reference text from a way-level ref and a relation-derived ref.
///
/// When only one is present (non-empty) it is used regardless of policy.
/// With both present:
///
/// - `WayFirst` returns the way ref.
/// - `RelationFirst` returns the relation ref.
/// - `Merge` replaces each way ref value with the first relation value that
///   extends it (`"I 95"` → `"I 95 North"`) and keeps it otherwise.
pub fn resolve_ref(way_ref: Option<&str>, relation_ref: Option<&str>, policy: RefPolicy) -> Option<String> {
    let way_ref = way_ref.filter(|s| !s.trim().is_empty());
    let relation_ref = relation_ref.filter(|s| !s.trim().is_empty());
    match (way_ref, relation_ref) {
        (None, None) => None,
        (Some(w), None) => Some(w.to_owned()),
        (None, Some(r)) => Some(r.to_owned()),
        (Some(w), Some(r)) => Some(match policy {
            RefPolicy::WayFirst      => w.to_owned(),
            RefPolicy::RelationFirst => r.to_owned(),
            RefPolicy::Merge         => merge_refs(w, r),
        }),
    }
}

fn merge_refs(way_ref: &str, relation_ref: &str) -> String {
    let relation: Vec<&str> = values(relation_ref).collect();
    values(way_ref)
        .map(|w| {
            relation
                .iter()
                .find(|r| r.len() > w.len() && r.starts_with(w))
                .copied()
                .unwrap_or(w)
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Trimmed, non-empty `;`-separated values.
fn values(text: &str) -> impl Iterator<Item = &str> {
    text.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn push_values(out: &mut Vec<SignEntry>, kind: SignKind, text: &str) {
    out.extend(values(text).map(|v| SignEntry { kind, text: v.to_owned() }));
}

/// Sign entries for a link edge of `way` leaving `node`.
pub fn exit_signs(way: &OsmWay, node: GraphId, maps: &NodeMaps, policy: RefPolicy) -> Vec<SignEntry> {
    let mut out = Vec::new();

    if let Some(number) = way.tag("junction:ref").or_else(|| maps.node_ref(node)) {
        push_values(&mut out, SignKind::ExitNumber, number);
    }

    let way_ref = way.tag("destination:ref").or_else(|| way.tag("ref"));
    if let Some(branch) = resolve_ref(way_ref, way.relation_ref.as_deref(), policy) {
        push_values(&mut out, SignKind::ExitBranch, &branch);
    }
    if let Some(street) = way.tag("destination:street") {
        push_values(&mut out, SignKind::ExitBranch, street);
    }

    if let Some(toward) = way.tag("destination").or_else(|| maps.exit_to(node)) {
        push_values(&mut out, SignKind::ExitToward, toward);
    }

    if let Some(name) = maps.name(node).or_else(|| way.tag("name")) {
        push_values(&mut out, SignKind::ExitName, name);
    }
    out
}
