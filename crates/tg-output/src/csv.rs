//! CSV tile dump.
//!
//! Each tile gets its own directory `<root>/<level>/<tile>/` holding:
//! - `nodes.csv`
//! - `edges.csv`
//! - `signs.csv`
//! - `restrictions.csv`
//!
//! Tiles never share files, so workers write concurrently without locking.

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::debug;

use tg_build::{TilePayload, TileWriter};
use tg_core::{GeoPoint, GraphId, TileId};

use crate::{OutputError, OutputResult, TileRows};

pub struct CsvTileWriter {
    root: PathBuf,
}

impl CsvTileWriter {
    /// Create `root` if needed.
    pub fn new(root: &Path) -> OutputResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self { root: root.to_path_buf() })
    }

    /// Directory the files of `tile` are written to.
    pub fn tile_dir(&self, tile: TileId) -> PathBuf {
        self.root.join(tile.level.to_string()).join(tile.tile.to_string())
    }

    fn write_rows(&self, rows: &TileRows) -> OutputResult<()> {
        let dir = self.tile_dir(rows.tile);
        fs::create_dir_all(&dir)?;

        let mut nodes = Writer::from_path(dir.join("nodes.csv"))?;
        nodes.write_record([
            "id", "osm_id", "lat", "lon", "edge_count", "node_type", "access_mask",
            "traffic_signal", "link_edge", "non_link_edge", "ref", "exit_to", "name",
        ])?;
        for n in &rows.nodes {
            nodes.write_record(&[
                n.id.to_string(),
                n.osm_id.to_string(),
                n.pos.lat.to_string(),
                n.pos.lon.to_string(),
                n.edge_count.to_string(),
                format!("{:?}", n.node_type),
                n.access_mask.to_string(),
                (n.traffic_signal as u8).to_string(),
                (n.link_edge as u8).to_string(),
                (n.non_link_edge as u8).to_string(),
                n.node_ref.clone().unwrap_or_default(),
                n.exit_to.clone().unwrap_or_default(),
                n.name.clone().unwrap_or_default(),
            ])?;
        }
        nodes.flush()?;

        let mut edges = Writer::from_path(dir.join("edges.csv"))?;
        edges.write_record([
            "index", "source", "target", "way_index", "importance", "forward", "reverse",
            "link", "traffic_signal", "shape_count", "length_m", "shape",
        ])?;
        for e in &rows.edges {
            edges.write_record(&[
                e.index.0.to_string(),
                e.source.to_string(),
                e.target.to_string(),
                e.way_index.to_string(),
                e.importance.to_string(),
                (e.forward as u8).to_string(),
                (e.reverse as u8).to_string(),
                (e.link as u8).to_string(),
                (e.traffic_signal as u8).to_string(),
                e.shape_count.to_string(),
                format!("{:.1}", e.length_m),
                shape_text(&e.shape),
            ])?;
        }
        edges.flush()?;

        let mut signs = Writer::from_path(dir.join("signs.csv"))?;
        signs.write_record(["edge", "kind", "text"])?;
        for s in &rows.signs {
            signs.write_record(&[s.edge.0.to_string(), s.kind.to_string(), s.text.clone()])?;
        }
        signs.flush()?;

        let mut restrictions = Writer::from_path(dir.join("restrictions.csv"))?;
        restrictions.write_record(["kind", "nodes", "from_way", "to_way"])?;
        for r in &rows.restrictions {
            restrictions.write_record(&[
                format!("{:?}", r.kind),
                ids_text(&r.nodes),
                r.from_way.to_string(),
                r.to_way.to_string(),
            ])?;
        }
        restrictions.flush()?;

        debug!(tile = %rows.tile, dir = %dir.display(), "tile csv written");
        Ok(())
    }
}

impl TileWriter for CsvTileWriter {
    type Error = OutputError;

    fn write_tile(&self, tile: &TilePayload<'_>) -> Result<(), OutputError> {
        self.write_rows(&TileRows::from_payload(tile))
    }
}

/// `lat lon` pairs separated by `;`.
fn shape_text(shape: &[GeoPoint]) -> String {
    shape
        .iter()
        .map(|p| format!("{:.7} {:.7}", p.lat, p.lon))
        .collect::<Vec<_>>()
        .join(";")
}

fn ids_text(ids: &[GraphId]) -> String {
    ids.iter().map(GraphId::to_string).collect::<Vec<_>>().join(";")
}
