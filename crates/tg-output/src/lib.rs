//! `tg-output` — tile writers for the tilegraph builder.
//!
//! Both backends implement [`tg_build::TileWriter`] and are handed to
//! [`tg_build::build_graph`]:
//!
//! | Backend             | Destination                                               |
//! |---------------------|-----------------------------------------------------------|
//! | [`MemoryTileWriter`] | `TileRows` per tile, kept in memory                      |
//! | [`CsvTileWriter`]    | `<root>/<level>/<tile>/{nodes,edges,signs,restrictions}.csv` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use tg_output::CsvTileWriter;
//!
//! let writer = CsvTileWriter::new(Path::new("./tiles"))?;
//! let summary = tg_build::build_graph(&data, &config, &writer)?;
//! println!("{summary}");
//! ```

pub mod csv;
pub mod error;
pub mod memory;
pub mod row;


pub use crate::csv::CsvTileWriter;
pub use error::{OutputError, OutputResult};
pub use memory::MemoryTileWriter;
pub use row::{EdgeRow, NodeRow, RestrictionRow, SignRow, TileRows};
