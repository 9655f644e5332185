//! Core error type.
//!
//! Downstream crates wrap `CoreError` as one variant of their own enums via
//! `#[from]`.

use thiserror::Error;

use crate::{GeoPoint, TileId};

/// Errors produced by `tg-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("hierarchy level {0} is not defined")]
    UnknownLevel(u8),

    #[error("coordinate {0} is outside the tileable range")]
    CoordinateOutOfRange(GeoPoint),

    #[error("tile {tile} is full: index {index} does not fit in a graph id")]
    IndexOverflow { tile: TileId, index: u32 },

    #[error("graph id field out of range: level {level}, tile {tile}, index {index}")]
    InvalidGraphId { level: u8, tile: u32, index: u32 },
}

/// Shorthand result type for `tg-core`.
pub type CoreResult<T> = Result<T, CoreError>;
