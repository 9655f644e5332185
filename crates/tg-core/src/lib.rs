//! `tg-core` — foundational types for the `tilegraph` routing-graph builder.
//!
//! This crate is a dependency of every other `tg-*` crate.  It has no `tg-*`
//! dependencies and a single required external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`ids`]     | `GraphId`, `TileId`, `EdgeIndex`, `WayIndex`                |
//! | [`geo`]     | `GeoPoint`, haversine distance                              |
//! | [`tiles`]   | `TileLevel`, `TileHierarchy` — coordinate → tile mapping    |
//! | [`attrs`]   | `RoadClass`, `NodeType`, access mask bits                   |
//! | [`config`]  | `BuildConfig`, `RefPolicy`                                  |
//! | [`quality`] | `DataQuality` defect / statistics accumulator               |
//! | [`error`]   | `CoreError`, `CoreResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod attrs;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod quality;
pub mod tiles;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use attrs::{access, NodeType, RoadClass};
pub use config::{BuildConfig, RefPolicy};
pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{EdgeIndex, GraphId, TileId, WayIndex};
pub use quality::DataQuality;
pub use tiles::{TileHierarchy, TileLevel};
