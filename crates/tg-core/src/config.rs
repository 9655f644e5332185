//! Build configuration.
//!
//! Loaded by the orchestrating application (TOML/JSON via the `serde`
//! feature, or constructed in code) and passed to every build phase.

use std::path::PathBuf;

use crate::{CoreError, CoreResult, TileHierarchy, TileLevel};

// ── RefPolicy ─────────────────────────────────────────────────────────────────

/// How exit-sign reference text is chosen when a way carries its own
/// reference tag and also inherits one from a route relation.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefPolicy {
    /// Way-level reference wins; relation reference is only a fallback.
    #[default]
    WayFirst,
    /// Relation reference wins; way-level reference is only a fallback.
    RelationFirst,
    /// Each way reference is replaced by the relation reference that extends
    /// it with a direction (`"I 95"` + `"I 95 North"` → `"I 95 North"`).
    Merge,
}

// ── BuildConfig ───────────────────────────────────────────────────────────────

/// Top-level build configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildConfig {
    /// Tile levels known to the build.
    pub hierarchy: TileHierarchy,

    /// Hierarchy level the graph is tiled at.  Default: 2 (local).
    pub level: u8,

    /// Worker thread count for tile finalization.  `None` uses all logical
    /// cores.
    pub threads: Option<usize>,

    /// File backing the external edge sequence.  Truncated at build start.
    pub edges_path: PathBuf,

    /// Maximum number of link edges walked from a junction while
    /// reclassifying ramps.  Longer chains keep their class.
    pub max_link_depth: usize,

    /// Exit-sign reference precedence.
    pub ref_policy: RefPolicy,
}

impl BuildConfig {
    /// The tile level the graph is built at.
    pub fn build_level(&self) -> CoreResult<&TileLevel> {
        self.hierarchy.level(self.level)
    }

    /// Reject configurations no build could run with.
    pub fn validate(&self) -> CoreResult<()> {
        self.hierarchy.validate()?;
        self.build_level()?;
        if self.threads == Some(0) {
            return Err(CoreError::Config("thread count must be at least 1".into()));
        }
        if self.max_link_depth == 0 {
            return Err(CoreError::Config("max_link_depth must be at least 1".into()));
        }
        if self.edges_path.as_os_str().is_empty() {
            return Err(CoreError::Config("edges_path is empty".into()));
        }
        Ok(())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            hierarchy:      TileHierarchy::default(),
            level:          2,
            threads:        None,
            edges_path:     std::env::temp_dir().join("tilegraph_edges.bin"),
            max_link_depth: 16,
            ref_policy:     RefPolicy::default(),
        }
    }
}
