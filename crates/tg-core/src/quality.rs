//! Data-quality accumulator.
//!
//! Every non-fatal anomaly met while building is counted here instead of
//! aborting the build.  The accumulator is purely additive: workers keep a
//! private instance and the results are combined with [`DataQuality::merge`],
//! so no counter is ever shared between threads.

use std::fmt;

/// Defect and volume counters for one build (or one worker's share of it).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataQuality {
    // ── Defects ───────────────────────────────────────────────────────────
    /// Ways with fewer than two node references (skipped).
    pub ways_too_short: u64,
    /// Ways referencing a node id with no node record (skipped).
    pub missing_nodes: u64,
    /// Ways with a node outside the tileable coordinate range (skipped).
    pub bad_coordinates: u64,
    /// Restrictions with an endpoint that is not a graph node (dropped).
    pub unmapped_restrictions: u64,
    /// Restrictions with fewer than two nodes (dropped).
    pub malformed_restrictions: u64,
    /// Link chains longer than the reclassification depth bound.
    pub link_depth_exceeded: u64,
    /// Tiles whose payload could not be assembled or written.
    pub tile_failures: u64,

    // ── Volume ────────────────────────────────────────────────────────────
    pub ways_processed: u64,
    pub nodes_created: u64,
    pub edges_created: u64,
    pub links_reclassified: u64,
    pub tiles_written: u64,
}

impl DataQuality {
    /// Add `other`'s counters into `self`.
    pub fn merge(&mut self, other: &DataQuality) {
        self.ways_too_short         += other.ways_too_short;
        self.missing_nodes          += other.missing_nodes;
        self.bad_coordinates        += other.bad_coordinates;
        self.unmapped_restrictions  += other.unmapped_restrictions;
        self.malformed_restrictions += other.malformed_restrictions;
        self.link_depth_exceeded    += other.link_depth_exceeded;
        self.tile_failures          += other.tile_failures;
        self.ways_processed         += other.ways_processed;
        self.nodes_created          += other.nodes_created;
        self.edges_created          += other.edges_created;
        self.links_reclassified     += other.links_reclassified;
        self.tiles_written          += other.tiles_written;
    }

    /// Sum of all defect counters.
    pub fn total_defects(&self) -> u64 {
        self.ways_too_short
            + self.missing_nodes
            + self.bad_coordinates
            + self.unmapped_restrictions
            + self.malformed_restrictions
            + self.link_depth_exceeded
            + self.tile_failures
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ways processed:         {}", self.ways_processed)?;
        writeln!(f, "nodes created:          {}", self.nodes_created)?;
        writeln!(f, "edges created:          {}", self.edges_created)?;
        writeln!(f, "links reclassified:     {}", self.links_reclassified)?;
        writeln!(f, "tiles written:          {}", self.tiles_written)?;
        writeln!(f, "defects:                {}", self.total_defects())?;
        writeln!(f, "  ways too short:       {}", self.ways_too_short)?;
        writeln!(f, "  missing nodes:        {}", self.missing_nodes)?;
        writeln!(f, "  bad coordinates:      {}", self.bad_coordinates)?;
        writeln!(f, "  unmapped restrictions: {}", self.unmapped_restrictions)?;
        writeln!(f, "  malformed restrictions: {}", self.malformed_restrictions)?;
        writeln!(f, "  link depth exceeded:  {}", self.link_depth_exceeded)?;
        write!(f,   "  tile failures:        {}", self.tile_failures)
    }
}
