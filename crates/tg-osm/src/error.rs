//! Source-data error type.

use thiserror::Error;

/// Errors produced by `tg-osm`.
#[derive(Debug, Error)]
pub enum OsmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type OsmResult<T> = Result<T, OsmError>;
