//! `tg-osm` — the parsed map-source data model consumed by the graph builder.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`data`]  | `OsmData`, `OsmWay`, `OsmNode`, `OsmRestriction`              |
//! | [`tags`]  | Tag interpretation: road class, oneway, link, node type       |
//! | [`osm`]   | `load_from_pbf` (feature = `"osm"` only)                      |
//! | [`error`] | `OsmError`, `OsmResult<T>`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.             |
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod data;
pub mod error;
pub mod tags;

#[cfg(feature = "osm")]
pub mod osm;


pub use data::{reference_counts, OsmData, OsmId, OsmNode, OsmRestriction, OsmWay, RestrictionKind, SignalDirection};
pub use error::{OsmError, OsmResult};
#[cfg(feature = "osm")]
pub use osm::load_from_pbf;
