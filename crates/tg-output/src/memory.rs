//! In-memory tile collector.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tg_build::{TilePayload, TileWriter};
use tg_core::TileId;

use crate::{OutputError, OutputResult, TileRows};

/// Keeps the rows of every written tile.  Intended for tests and small
/// extracts.
#[derive(Default)]
pub struct MemoryTileWriter {
    tiles: Mutex<BTreeMap<TileId, TileRows>>,
}

impl MemoryTileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written for `tile`, if any.
    pub fn tile(&self, tile: TileId) -> OutputResult<Option<TileRows>> {
        let tiles = self.tiles.lock().map_err(|_| OutputError::Poisoned)?;
        Ok(tiles.get(&tile).cloned())
    }

    pub fn len(&self) -> OutputResult<usize> {
        Ok(self.tiles.lock().map_err(|_| OutputError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> OutputResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// All collected tiles, ordered by tile id.
    pub fn into_tiles(self) -> OutputResult<BTreeMap<TileId, TileRows>> {
        self.tiles.into_inner().map_err(|_| OutputError::Poisoned)
    }
}

impl TileWriter for MemoryTileWriter {
    type Error = OutputError;

    fn write_tile(&self, tile: &TilePayload<'_>) -> OutputResult<()> {
        let rows = TileRows::from_payload(tile);
        let mut tiles = self.tiles.lock().map_err(|_| OutputError::Poisoned)?;
        tiles.insert(tile.tile, rows);
        Ok(())
    }
}
