//! Tile addressing: geographic coordinate + hierarchy level → tile.
//!
//! Each level covers the globe with a regular grid of square tiles
//! `size_deg` degrees on a side.  Tiles are numbered row-major from the
//! south-west corner:
//!
//! ```text
//! col  = floor((lon + 180) / size)
//! row  = floor((lat +  90) / size)
//! tile = row * ncolumns + col
//! ```
//!
//! Points on the north (`lat = 90`) or east (`lon = 180`) edge are clamped
//! into the last row / column so every valid coordinate has a tile.
//!
//! All functions are pure; the hierarchy holds only the level table.

use crate::ids::MAX_TILE;
use crate::{CoreError, CoreResult, GeoPoint, TileId};

// ── TileLevel ─────────────────────────────────────────────────────────────────

/// One tier of the hierarchy (e.g. highway, arterial, local).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileLevel {
    pub level: u8,
    /// Side length of one tile in degrees.  Must divide 180 evenly.
    pub size_deg: f64,
    pub name: String,
}

impl TileLevel {
    pub fn new(level: u8, size_deg: f64, name: impl Into<String>) -> Self {
        Self { level, size_deg, name: name.into() }
    }

    #[inline]
    pub fn ncolumns(&self) -> u32 {
        (360.0 / self.size_deg).round() as u32
    }

    #[inline]
    pub fn nrows(&self) -> u32 {
        (180.0 / self.size_deg).round() as u32
    }

    /// Total number of tiles at this level.
    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.ncolumns() as u64 * self.nrows() as u64
    }

    /// Tile containing `pos`.
    pub fn tile_for(&self, pos: GeoPoint) -> CoreResult<TileId> {
        if !pos.is_valid() {
            return Err(CoreError::CoordinateOutOfRange(pos));
        }
        let ncols = self.ncolumns();
        let col = (((pos.lon + 180.0) / self.size_deg).floor() as u32).min(ncols - 1);
        let row = (((pos.lat + 90.0) / self.size_deg).floor() as u32).min(self.nrows() - 1);
        TileId::new(self.level, row * ncols + col)
    }

    /// South-west and north-east corners of `tile`.
    pub fn bounds(&self, tile: u32) -> (GeoPoint, GeoPoint) {
        let ncols = self.ncolumns();
        let row = (tile / ncols) as f64;
        let col = (tile % ncols) as f64;
        let sw = GeoPoint::new(row * self.size_deg - 90.0, col * self.size_deg - 180.0);
        let ne = GeoPoint::new(sw.lat + self.size_deg, sw.lon + self.size_deg);
        (sw, ne)
    }

    fn validate(&self) -> CoreResult<()> {
        if !(self.size_deg.is_finite() && self.size_deg > 0.0) {
            return Err(CoreError::Config(format!(
                "level {} has non-positive tile size {}",
                self.level, self.size_deg
            )));
        }
        let rows = 180.0 / self.size_deg;
        if (rows - rows.round()).abs() > 1e-9 {
            return Err(CoreError::Config(format!(
                "level {} tile size {} does not divide 180 degrees",
                self.level, self.size_deg
            )));
        }
        if self.tile_count() > MAX_TILE as u64 + 1 {
            return Err(CoreError::Config(format!(
                "level {} needs {} tiles, more than a graph id can address",
                self.level,
                self.tile_count()
            )));
        }
        Ok(())
    }
}

// ── TileHierarchy ─────────────────────────────────────────────────────────────

/// The set of tile levels the graph may be built at.
///
/// The default is the classic three-tier layout:
///
/// | Level | Size   | Name       |
/// |-------|--------|------------|
/// | 0     | 4°     | highway    |
/// | 1     | 1°     | arterial   |
/// | 2     | 0.25°  | local      |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileHierarchy {
    pub levels: Vec<TileLevel>,
}

impl TileHierarchy {
    pub fn new(levels: Vec<TileLevel>) -> Self {
        Self { levels }
    }

    pub fn level(&self, level: u8) -> CoreResult<&TileLevel> {
        self.levels
            .iter()
            .find(|l| l.level == level)
            .ok_or(CoreError::UnknownLevel(level))
    }

    /// Tile containing `pos` at hierarchy `level`.
    pub fn tile_id(&self, level: u8, pos: GeoPoint) -> CoreResult<TileId> {
        self.level(level)?.tile_for(pos)
    }

    /// Check every level for a usable tile size and unique level numbers.
    pub fn validate(&self) -> CoreResult<()> {
        if self.levels.is_empty() {
            return Err(CoreError::Config("tile hierarchy has no levels".into()));
        }
        for (i, l) in self.levels.iter().enumerate() {
            if self.levels[..i].iter().any(|o| o.level == l.level) {
                return Err(CoreError::Config(format!("duplicate hierarchy level {}", l.level)));
            }
            if l.level > crate::ids::MAX_LEVEL {
                return Err(CoreError::UnknownLevel(l.level));
            }
            l.validate()?;
        }
        Ok(())
    }
}

impl Default for TileHierarchy {
    fn default() -> Self {
        Self::new(vec![
            TileLevel::new(0, 4.0, "highway"),
            TileLevel::new(1, 1.0, "arterial"),
            TileLevel::new(2, 0.25, "local"),
        ])
    }
}
