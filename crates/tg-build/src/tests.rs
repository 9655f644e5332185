//! Unit tests for tg-build.

#[cfg(test)]
mod fixtures {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use tempfile::TempDir;

    use tg_core::{BuildConfig, DataQuality, EdgeIndex, GeoPoint, GraphId, TileId};
    use tg_osm::{OsmData, OsmId, OsmNode};

    use crate::{Edge, GraphBuilder, Restriction, SignEntry, TilePayload, TileWriter};

    pub fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    pub fn config(dir: &TempDir) -> BuildConfig {
        BuildConfig {
            edges_path: dir.path().join("edges.bin"),
            threads: Some(2),
            ..BuildConfig::default()
        }
    }

    /// Node records at `(id, lat, lon)`.
    pub fn data(nodes: &[(OsmId, f64, f64)]) -> OsmData {
        let mut data = OsmData::new();
        for &(id, lat, lon) in nodes {
            data.add_node(id, OsmNode::new(GeoPoint::new(lat, lon)));
        }
        data
    }

    /// `n` nodes with ids `1..=n` spaced ~100 m apart along a line in Mobile, AL.
    pub fn line_nodes(n: i64) -> OsmData {
        let nodes: Vec<_> = (1..=n).map(|i| (i, 30.69, -88.04 + 0.001 * i as f64)).collect();
        data(&nodes)
    }

    pub fn construct(data: &OsmData, dir: &TempDir) -> (GraphBuilder, DataQuality) {
        let mut quality = DataQuality::default();
        let mut builder = GraphBuilder::new(&config(dir)).unwrap();
        builder.construct_edges(data, &mut quality).unwrap();
        (builder, quality)
    }

    pub fn all_edges(builder: &mut GraphBuilder) -> Vec<Edge> {
        (0..builder.edge_count())
            .map(|i| builder.edge(EdgeIndex(i as u32)).unwrap())
            .collect()
    }

    /// Owned copy of what a tile writer received.
    #[derive(Clone, Debug, Default)]
    pub struct Written {
        pub nodes: Vec<GraphId>,
        pub edges: Vec<(EdgeIndex, Edge)>,
        pub restrictions: Vec<Restriction>,
        pub signs: Vec<(EdgeIndex, Vec<SignEntry>)>,
    }

    /// Writer that records payloads, refuses `fail` and panics on `panic`.
    #[derive(Default)]
    pub struct Collect {
        pub tiles: Mutex<BTreeMap<TileId, Written>>,
        pub fail: Option<TileId>,
        pub panic: Option<TileId>,
    }

    impl TileWriter for Collect {
        type Error = String;

        fn write_tile(&self, tile: &TilePayload<'_>) -> Result<(), String> {
            if self.fail == Some(tile.tile) {
                return Err(format!("refusing tile {}", tile.tile));
            }
            if self.panic == Some(tile.tile) {
                panic!("writer bug on tile {}", tile.tile);
            }
            let written = Written {
                nodes: (0..tile.nodes.len()).map(|i| tile.node_id(i)).collect(),
                edges: tile.edges.iter().map(|e| (e.index, e.edge)).collect(),
                restrictions: tile.restrictions.to_vec(),
                signs: tile.signs.iter().map(|s| (s.edge, s.entries.to_vec())).collect(),
            };
            self.tiles.lock().unwrap().insert(tile.tile, written);
            Ok(())
        }
    }
}

#[cfg(test)]
mod sequence {
    use std::path::Path;

    use crate::{FixedRecord, Sequence, SequenceError};

    use super::fixtures::tmp;

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Pair(u32, u32);

    impl FixedRecord for Pair {
        const SIZE: usize = 8;
        fn encode(&self, buf: &mut [u8]) {
            buf[..4].copy_from_slice(&self.0.to_le_bytes());
            buf[4..8].copy_from_slice(&self.1.to_le_bytes());
        }
        fn decode(buf: &[u8]) -> Self {
            Pair(
                u32::from_le_bytes(buf[..4].try_into().unwrap()),
                u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            )
        }
    }

    fn filled(path: &Path, n: u32) -> Sequence<Pair> {
        let mut seq = Sequence::create_with_buffer(path, 3).unwrap();
        for i in 0..n {
            assert_eq!(seq.append(&Pair(i, i * 10)).unwrap(), i as usize);
        }
        seq
    }

    #[test]
    fn reads_span_flushed_and_pending() {
        let dir = tmp();
        let mut seq = filled(&dir.path().join("s.bin"), 7);
        assert_eq!(seq.len(), 7);
        // Six records were flushed in two batches; the last is still buffered.
        assert_eq!(std::fs::metadata(seq.path()).unwrap().len(), 6 * 8);
        assert_eq!(seq.get(0).unwrap(), Pair(0, 0));
        assert_eq!(seq.get(5).unwrap(), Pair(5, 50));
        assert_eq!(seq.get(6).unwrap(), Pair(6, 60));
    }

    #[test]
    fn update_in_place() {
        let dir = tmp();
        let mut seq = filled(&dir.path().join("s.bin"), 7);
        seq.update(1, &Pair(100, 1)).unwrap();
        seq.update(6, &Pair(600, 6)).unwrap();
        // Appending after a seek-and-write must still land at the end.
        seq.append(&Pair(7, 70)).unwrap();
        seq.flush().unwrap();
        assert_eq!(seq.get(1).unwrap(), Pair(100, 1));
        assert_eq!(seq.get(6).unwrap(), Pair(600, 6));
        assert_eq!(seq.get(7).unwrap(), Pair(7, 70));
    }

    #[test]
    fn out_of_range() {
        let dir = tmp();
        let mut seq = filled(&dir.path().join("s.bin"), 2);
        assert!(matches!(seq.get(2), Err(SequenceError::OutOfRange { index: 2, len: 2 })));
        assert!(seq.update(5, &Pair(0, 0)).is_err());
    }

    #[test]
    fn freeze_maps_every_record() {
        let dir = tmp();
        let mut seq = filled(&dir.path().join("s.bin"), 5);
        seq.update(4, &Pair(44, 44)).unwrap();
        let frozen = seq.freeze().unwrap();
        assert_eq!(frozen.len(), 5);
        assert_eq!(frozen.get(2), Some(Pair(2, 20)));
        assert_eq!(frozen.get(4), Some(Pair(44, 44)));
        assert_eq!(frozen.get(5), None);
        assert_eq!(frozen.iter().count(), 5);
    }

    #[test]
    fn empty_freeze() {
        let dir = tmp();
        let seq: Sequence<Pair> = Sequence::create(&dir.path().join("s.bin")).unwrap();
        let frozen = seq.freeze().unwrap();
        assert!(frozen.is_empty());
        assert_eq!(frozen.get(0), None);
    }

    #[test]
    fn create_fails_in_missing_directory() {
        let dir = tmp();
        let res: Result<Sequence<Pair>, _> = Sequence::create(&dir.path().join("nope/s.bin"));
        assert!(matches!(res, Err(SequenceError::Io { .. })));
    }
}

#[cfg(test)]
mod edge {
    use tg_core::{GraphId, RoadClass, WayIndex};
    use tg_osm::{OsmWay, SignalDirection};

    use crate::{Edge, EdgeAttributes, FixedRecord};

    fn gid(i: u32) -> GraphId {
        GraphId::new(2, 100, i).unwrap()
    }

    #[test]
    fn attribute_bit_positions() {
        let a = EdgeAttributes { shape_count: 7, importance: RoadClass::Secondary, ..Default::default() };
        assert_eq!(a.to_bits(), 7 | (3 << 16));
        let link = EdgeAttributes { link: true, ..Default::default() };
        assert_eq!(link.to_bits() & !(0b111 << 16), 1 << 24);
        let fwd = EdgeAttributes { forward: true, importance: RoadClass::Motorway, ..Default::default() };
        assert_eq!(fwd.to_bits(), 1 << 19);
    }

    #[test]
    fn attributes_survive_packing() {
        let a = EdgeAttributes {
            shape_count: u16::MAX,
            importance: RoadClass::Trunk,
            forward: true,
            reverse: false,
            traffic_signal: true,
            forward_signal: false,
            backward_signal: true,
            link: true,
        };
        assert_eq!(EdgeAttributes::from_bits(a.to_bits()), a);
        // Spare bits are ignored.
        assert_eq!(EdgeAttributes::from_bits(a.to_bits() | 0xFE00_0000), a);
    }

    #[test]
    fn record_layout() {
        let way = OsmWay::new(9, vec![1, 2], RoadClass::Primary).oneway().as_link();
        let e = Edge::new(gid(1), GraphId::INVALID, WayIndex(42), 1234, 3, &way);
        let mut buf = [0u8; Edge::SIZE];
        e.encode(&mut buf);
        assert_eq!(&buf[8..12], &42u32.to_le_bytes());
        assert_eq!(Edge::decode(&buf), e);
        assert!(!Edge::decode(&buf).target.is_valid());
    }

    #[test]
    fn attributes_from_way() {
        let way = OsmWay::new(9, vec![1, 2], RoadClass::Primary).oneway().as_link();
        let e = Edge::new(gid(1), gid(2), WayIndex(0), 1, 1, &way);
        assert_eq!(e.attributes.importance, RoadClass::Primary);
        assert!(e.attributes.forward && !e.attributes.reverse && e.attributes.link);
    }

    #[test]
    fn direction_helpers() {
        let way = OsmWay::new(9, vec![1, 2], RoadClass::Primary).oneway();
        let e = Edge::new(gid(1), gid(2), WayIndex(0), 1, 1, &way);
        assert_eq!(e.other_end(gid(1)), gid(2));
        assert_eq!(e.other_end(gid(2)), gid(1));
        assert!(e.leaves(gid(1)));
        assert!(!e.leaves(gid(2)));
    }

    #[test]
    fn signal_directions() {
        let way = OsmWay::new(9, vec![1, 2], RoadClass::Primary);
        let mut e = Edge::new(gid(1), gid(2), WayIndex(0), 1, 1, &way);
        e.mark_signal(SignalDirection::Backward);
        assert!(e.attributes.traffic_signal && e.attributes.backward_signal);
        assert!(!e.attributes.forward_signal);
        e.mark_signal(SignalDirection::Both);
        assert!(e.attributes.forward_signal);
    }
}

#[cfg(test)]
mod construction {
    use rustc_hash::FxHashSet;

    use tg_core::{access, GeoPoint, GraphId, NodeType, RoadClass};
    use tg_osm::{OsmNode, OsmWay, SignalDirection};

    use crate::GraphBuilder;

    use super::fixtures::{all_edges, config, construct, data, line_nodes, tmp};

    #[test]
    fn single_street_with_shape_point() {
        let mut d = line_nodes(3);
        d.add_way(OsmWay::new(100, vec![1, 2, 3], RoadClass::Residential));
        let dir = tmp();
        let (mut b, q) = construct(&d, &dir);

        assert_eq!(b.nodes().len(), 2);
        assert_eq!(b.edge_count(), 1);
        assert!(b.graph_id(2).is_none());
        let e = all_edges(&mut b)[0];
        assert_eq!(e.attributes.shape_count, 2);
        assert!(e.attributes.forward && e.attributes.reverse);
        assert_eq!(e.source, b.graph_id(1).unwrap());
        assert_eq!(e.target, b.graph_id(3).unwrap());
        assert_eq!((q.ways_processed, q.nodes_created, q.edges_created), (1, 2, 1));
    }

    #[test]
    fn shared_interior_point_becomes_node() {
        let mut d = line_nodes(6);
        d.add_way(OsmWay::new(100, vec![1, 2, 3, 4], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![5, 3, 6], RoadClass::Residential));
        let dir = tmp();
        let (b, _) = construct(&d, &dir);

        // 1, 4, 5, 6 are endpoints; 3 is shared; 2 is a shape point.
        for id in [1, 3, 4, 5, 6] {
            assert!(b.graph_id(id).is_some(), "node {id}");
        }
        assert!(b.graph_id(2).is_none());
        assert_eq!(b.nodes().len(), 5);
        assert_eq!(b.edge_count(), 4);
    }

    #[test]
    fn dedup_collects_edges_from_both_ways() {
        let mut d = line_nodes(5);
        d.add_way(OsmWay::new(100, vec![1, 2, 3], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![4, 2, 5], RoadClass::Residential));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);

        let shared = b.graph_id(2).unwrap();
        let incident = b.node(shared).unwrap().edges.clone();
        assert_eq!(incident.len(), 4);
        let ways: FxHashSet<u32> = incident.iter().map(|&i| b.edge(i).unwrap().way_index.0).collect();
        let expected: FxHashSet<u32> = [0, 1].into_iter().collect();
        assert_eq!(ways, expected);
        for &i in &incident {
            let e = b.edge(i).unwrap();
            assert!(e.source == shared || e.target == shared);
        }
    }

    #[test]
    fn shape_counts_cover_the_way() {
        let mut d = line_nodes(9);
        d.add_way(OsmWay::new(100, vec![1, 2, 3, 4, 5, 6, 7], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![8, 3, 9], RoadClass::Primary));
        d.add_way(OsmWay::new(102, vec![9, 5], RoadClass::Primary));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);
        let edges = all_edges(&mut b);

        for (way, len) in [(0u32, 7u32), (1, 3), (2, 2)] {
            let mine: Vec<_> = edges.iter().filter(|e| e.way_index.0 == way).collect();
            assert!(mine.iter().all(|e| e.attributes.shape_count >= 1));
            let total: u32 = mine.iter().map(|e| e.attributes.shape_count as u32).sum();
            assert_eq!(total, len - 1, "way {way}");
        }
        assert_eq!(edges.iter().filter(|e| e.way_index.0 == 0).count(), 3);

        // The run of each edge ends on its target's coordinate.
        for e in &edges {
            let last = (e.shape_index + e.attributes.shape_count as u32 - 1) as usize;
            assert_eq!(b.shapes()[last], b.node(e.target).unwrap().pos);
            assert_eq!(b.shapes()[e.shape_index as usize - 1], b.node(e.source).unwrap().pos);
        }
    }

    #[test]
    fn invalid_ways_are_skipped_whole() {
        let mut d = line_nodes(4);
        d.add_node(5, OsmNode::new(GeoPoint::new(95.0, 0.0)));
        d.add_way(OsmWay::new(100, vec![1], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![1, 2, 99], RoadClass::Primary));
        d.add_way(OsmWay::new(102, vec![3, 5], RoadClass::Primary));
        d.add_way(OsmWay::new(103, vec![3, 4], RoadClass::Primary));
        let dir = tmp();
        let (b, q) = construct(&d, &dir);

        assert_eq!(q.ways_too_short, 1);
        assert_eq!(q.missing_nodes, 1);
        assert_eq!(q.bad_coordinates, 1);
        assert_eq!(q.ways_processed, 1);
        // Only way 103 contributed.
        assert_eq!(b.nodes().len(), 2);
        assert!(b.graph_id(1).is_none());
        assert_eq!(b.edge_count(), 1);
    }

    #[test]
    fn skipped_way_does_not_promote_shared_point() {
        let mut d = line_nodes(5);
        d.add_way(OsmWay::new(100, vec![1, 2, 3], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![4, 2, 99], RoadClass::Primary));
        let dir = tmp();
        let (mut b, q) = construct(&d, &dir);

        assert_eq!(q.missing_nodes, 1);
        assert!(b.graph_id(2).is_none());
        assert_eq!(b.nodes().len(), 2);
        assert_eq!(all_edges(&mut b)[0].attributes.shape_count, 2);
    }

    #[test]
    fn long_run_is_split_at_shape_limit() {
        let n = u16::MAX as i64 + 10;
        let nodes: Vec<_> = (1..=n).map(|i| (i, 30.69, -88.04 + 1e-6 * i as f64)).collect();
        let mut d = data(&nodes);
        d.add_way(OsmWay::new(100, (1..=n).collect(), RoadClass::Primary));
        let dir = tmp();
        let (mut b, q) = construct(&d, &dir);
        let edges = all_edges(&mut b);

        assert_eq!(edges.len(), 2);
        assert_eq!(q.nodes_created, 3);
        assert_eq!(edges[0].attributes.shape_count, u16::MAX);
        assert!(edges.iter().all(|e| e.attributes.shape_count >= 1));
        let total: i64 = edges.iter().map(|e| e.attributes.shape_count as i64).sum();
        assert_eq!(total, n - 1);
        // The split point is a node shared by both edges.
        assert_eq!(edges[0].target, edges[1].source);
        assert_eq!(b.graph_id(u16::MAX as i64 + 1), Some(edges[0].target));
    }

    #[test]
    fn closed_way_is_a_loop() {
        let mut d = line_nodes(3);
        d.add_way(OsmWay::new(100, vec![1, 2, 3, 1], RoadClass::Service));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);
        assert_eq!(b.nodes().len(), 1);
        let e = all_edges(&mut b)[0];
        assert_eq!(e.source, e.target);
        assert_eq!(e.attributes.shape_count, 3);
        assert_eq!(b.node(e.source).unwrap().edge_count(), 1);
    }

    #[test]
    fn signals_and_node_attributes() {
        let mut d = line_nodes(3);
        let signal = d.nodes[&2].with_signal(SignalDirection::Forward);
        d.add_node(2, signal);
        let mut gate = d.nodes[&3];
        gate.node_type = NodeType::Gate;
        gate.access_mask = access::PEDESTRIAN;
        d.add_node(3, gate);
        d.node_ref.insert(1, "12A".into());
        d.add_way(OsmWay::new(100, vec![1, 2, 3], RoadClass::Primary));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);

        let e = all_edges(&mut b)[0];
        assert!(e.attributes.traffic_signal && e.attributes.forward_signal);
        assert!(!e.attributes.backward_signal);

        let n1 = b.node(b.graph_id(1).unwrap()).unwrap();
        assert!(n1.attributes.has_ref && !n1.attributes.has_name);
        let n3 = b.node(b.graph_id(3).unwrap()).unwrap();
        assert_eq!(n3.attributes.node_type, NodeType::Gate);
        assert_eq!(n3.attributes.access_mask, access::PEDESTRIAN);
    }

    #[test]
    fn nodes_land_in_their_coordinate_tile() {
        let mut d = data(&[
            (1, 30.69, -88.04),
            (2, 30.69, -87.90),
            (3, 30.69, -87.70),
            (4, 31.10, -88.30),
            (5, -33.90, 151.20),
            (6, -33.85, 151.21),
        ]);
        d.add_way(OsmWay::new(100, vec![1, 2, 3, 4], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![2, 3, 1], RoadClass::Primary));
        d.add_way(OsmWay::new(102, vec![5, 6], RoadClass::Primary));
        let dir = tmp();
        let (b, _) = construct(&d, &dir);
        let level = b.level().clone();

        let mut seen: FxHashSet<GraphId> = FxHashSet::default();
        for (id, node) in b.nodes().iter() {
            assert_eq!(id.tile_id(), level.tile_for(node.pos).unwrap());
            assert!(seen.insert(id));
            assert_eq!(b.graph_id(node.osm_id), Some(id));
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(b.nodes().tile_count(), 5);

        // Both Sydney nodes share a tile and are numbered in creation order.
        let sydney = level.tile_for(GeoPoint::new(-33.90, 151.20)).unwrap();
        assert_eq!(b.nodes().tile(sydney).len(), 2);
        assert_eq!(b.graph_id(5).unwrap().index, 0);
        assert_eq!(b.graph_id(6).unwrap().index, 1);
    }

    #[test]
    fn edge_file_is_created_at_configured_path() {
        let dir = tmp();
        let cfg = config(&dir);
        let _b = GraphBuilder::new(&cfg).unwrap();
        assert!(cfg.edges_path.exists());
    }

    #[test]
    fn bad_config_rejected() {
        let dir = tmp();
        let mut cfg = config(&dir);
        cfg.level = 6;
        assert!(GraphBuilder::new(&cfg).is_err());
    }
}

#[cfg(test)]
mod reclassify {
    use rand::rngs::SmallRng;
    use rand::seq::index::sample;
    use rand::{Rng, SeedableRng};

    use tg_core::{DataQuality, RoadClass};
    use tg_osm::{OsmData, OsmWay};

    use crate::{best_non_link_class, reclassify_links, ChainWalk};

    use super::fixtures::{all_edges, construct, line_nodes, tmp};

    /// Junction A (id 2) on a primary road and a tertiary side street; a
    /// three-edge ramp A → 10 → 11 → B; B (id 6) on a trunk road.
    fn ramp_network() -> OsmData {
        let mut d = line_nodes(12);
        d.add_way(OsmWay::new(1, vec![1, 2, 3], RoadClass::Primary));
        d.add_way(OsmWay::new(2, vec![2, 4], RoadClass::Tertiary));
        d.add_way(OsmWay::new(3, vec![2, 10], RoadClass::Tertiary).oneway().as_link());
        d.add_way(OsmWay::new(4, vec![10, 11], RoadClass::Tertiary).oneway().as_link());
        d.add_way(OsmWay::new(5, vec![11, 6], RoadClass::Tertiary).oneway().as_link());
        d.add_way(OsmWay::new(6, vec![5, 6, 7], RoadClass::Trunk));
        d
    }

    fn link_classes(edges: &[crate::Edge]) -> Vec<RoadClass> {
        edges.iter().filter(|e| e.attributes.link).map(|e| e.attributes.importance).collect()
    }

    #[test]
    fn chain_takes_best_class_of_both_ends() {
        let dir = tmp();
        let (mut b, _) = construct(&ramp_network(), &dir);
        let mut q = DataQuality::default();
        let changed = b.reclassify_links(16, &mut q).unwrap();

        let edges = all_edges(&mut b);
        assert_eq!(link_classes(&edges), vec![RoadClass::Trunk; 3]);
        assert_eq!(changed, 3);
        assert_eq!(q.links_reclassified, 3);
        assert_eq!(q.link_depth_exceeded, 0);
        // Through roads are never touched.
        assert!(edges.iter().any(|e| !e.attributes.link && e.attributes.importance == RoadClass::Tertiary));
    }

    #[test]
    fn chain_past_bound_keeps_class() {
        let dir = tmp();
        let (mut b, _) = construct(&ramp_network(), &dir);
        let mut q = DataQuality::default();
        b.reclassify_links(2, &mut q).unwrap();

        let edges = all_edges(&mut b);
        assert_eq!(link_classes(&edges), vec![RoadClass::Tertiary; 3]);
        // Both junctions tried the chain.
        assert_eq!(q.link_depth_exceeded, 2);
        assert_eq!(q.links_reclassified, 0);
    }

    #[test]
    fn chain_exactly_at_bound_is_processed() {
        let dir = tmp();
        let (mut b, _) = construct(&ramp_network(), &dir);
        let mut q = DataQuality::default();
        b.reclassify_links(3, &mut q).unwrap();
        assert_eq!(link_classes(&all_edges(&mut b)), vec![RoadClass::Trunk; 3]);
    }

    #[test]
    fn dead_end_chain_unchanged() {
        let mut d = line_nodes(12);
        d.add_way(OsmWay::new(1, vec![1, 2, 3], RoadClass::Motorway));
        d.add_way(OsmWay::new(2, vec![2, 10], RoadClass::Service).as_link());
        d.add_way(OsmWay::new(3, vec![10, 11], RoadClass::Service).as_link());
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);
        let mut q = DataQuality::default();
        assert_eq!(b.reclassify_links(16, &mut q).unwrap(), 0);
        assert_eq!(link_classes(&all_edges(&mut b)), vec![RoadClass::Service; 2]);
    }

    #[test]
    fn sibling_chains_keep_their_own_class() {
        // Motorway at 2; ramp 2 → 4 onto a residential street; a second
        // ramp 4 → 6 joins two residential streets.
        let mut d = line_nodes(8);
        d.add_way(OsmWay::new(1, vec![1, 2, 3], RoadClass::Motorway));
        d.add_way(OsmWay::new(2, vec![2, 4], RoadClass::Residential).oneway().as_link());
        d.add_way(OsmWay::new(3, vec![5, 4], RoadClass::Residential));
        d.add_way(OsmWay::new(4, vec![4, 6], RoadClass::Residential).oneway().as_link());
        d.add_way(OsmWay::new(5, vec![6, 7], RoadClass::Residential));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);
        let mut q = DataQuality::default();
        assert_eq!(b.reclassify_links(16, &mut q).unwrap(), 1);

        let edges = all_edges(&mut b);
        let class_of = |way: u32| {
            edges.iter().find(|e| e.way_index.0 == way).unwrap().attributes.importance
        };
        assert_eq!(class_of(1), RoadClass::Motorway);
        assert_eq!(class_of(3), RoadClass::Residential);
    }

    #[test]
    fn long_sibling_does_not_block_short_chain() {
        // Junction 2 on a primary road.  Ramp 2 → 3 reaches a trunk road in
        // one edge; ramp 2 → 10 → 11 → 12 → 4 needs four.
        let mut d = line_nodes(12);
        d.add_way(OsmWay::new(1, vec![1, 2], RoadClass::Primary));
        d.add_way(OsmWay::new(2, vec![2, 3], RoadClass::Tertiary).as_link());
        d.add_way(OsmWay::new(3, vec![3, 5], RoadClass::Trunk));
        d.add_way(OsmWay::new(4, vec![2, 10], RoadClass::Tertiary).as_link());
        d.add_way(OsmWay::new(5, vec![10, 11], RoadClass::Tertiary).as_link());
        d.add_way(OsmWay::new(6, vec![11, 12], RoadClass::Tertiary).as_link());
        d.add_way(OsmWay::new(7, vec![12, 4], RoadClass::Tertiary).as_link());
        d.add_way(OsmWay::new(8, vec![4, 6], RoadClass::Secondary));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);
        let mut q = DataQuality::default();
        assert_eq!(b.reclassify_links(2, &mut q).unwrap(), 1);

        let edges = all_edges(&mut b);
        let short = edges.iter().find(|e| e.way_index.0 == 1).unwrap();
        assert_eq!(short.attributes.importance, RoadClass::Trunk);
        let long: Vec<_> = edges.iter().filter(|e| (3..=6).contains(&e.way_index.0)).collect();
        assert_eq!(long.len(), 4);
        assert!(long.iter().all(|e| e.attributes.importance == RoadClass::Tertiary));
        // Junctions 2 and 4 each tried the long ramp.
        assert_eq!(q.link_depth_exceeded, 2);
    }

    #[test]
    fn walk_reports_chain_and_far_end() {
        let dir = tmp();
        let (mut b, _) = construct(&ramp_network(), &dir);
        let junction = b.graph_id(2).unwrap();
        let nodes = b.nodes().clone();
        let mut edges = crate::Sequence::create(&dir.path().join("copy.bin")).unwrap();
        for e in all_edges(&mut b) {
            edges.append(&e).unwrap();
        }
        let first = nodes.get(junction).unwrap().edges.iter().copied()
            .find(|&i| edges.get(i.index()).unwrap().attributes.link)
            .unwrap();
        match crate::reclassify::walk_chain(junction, first, &nodes, &mut edges, 16).unwrap() {
            ChainWalk::Complete { edges, endpoint_class } => {
                assert_eq!(edges.len(), 3);
                assert_eq!(endpoint_class, Some(RoadClass::Trunk));
            }
            ChainWalk::Bounded => panic!("chain should close within the bound"),
        }
        let start = nodes.get(junction).unwrap();
        assert_eq!(best_non_link_class(start, &mut edges).unwrap(), RoadClass::Primary);
        let ramp_node = nodes.get(b.graph_id(10).unwrap()).unwrap();
        assert_eq!(best_non_link_class(ramp_node, &mut edges).unwrap(), RoadClass::Other);
    }

    #[test]
    fn free_function_matches_builder_method() {
        let dir = tmp();
        let (mut b, _) = construct(&ramp_network(), &dir);
        let nodes = b.nodes().clone();
        let mut edges = crate::Sequence::create(&dir.path().join("copy.bin")).unwrap();
        for e in all_edges(&mut b) {
            edges.append(&e).unwrap();
        }
        let mut q = DataQuality::default();
        assert_eq!(reclassify_links(&nodes, &mut edges, 16, &mut q).unwrap(), 3);
    }

    fn random_network(seed: u64) -> OsmData {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut d = line_nodes(40);
        for way in 0..60 {
            let len = rng.gen_range(2..5);
            let nodes: Vec<i64> = sample(&mut rng, 40, len).into_iter().map(|i| i as i64 + 1).collect();
            let class = RoadClass::from_bits(rng.gen_range(0..8));
            let mut w = OsmWay::new(way, nodes, class);
            if rng.gen_bool(0.5) {
                w = w.as_link();
            }
            if rng.gen_bool(0.3) {
                w = w.oneway();
            }
            d.add_way(w);
        }
        d
    }

    #[test]
    fn second_run_changes_nothing() {
        for seed in [1, 7, 42, 1234] {
            let dir = tmp();
            let (mut b, _) = construct(&random_network(seed), &dir);
            for depth in [2, 16] {
                let mut q = DataQuality::default();
                b.reclassify_links(depth, &mut q).unwrap();
                let once: Vec<_> = all_edges(&mut b).iter().map(|e| e.attributes.importance).collect();
                assert_eq!(b.reclassify_links(depth, &mut q).unwrap(), 0, "seed {seed} depth {depth}");
                let twice: Vec<_> = all_edges(&mut b).iter().map(|e| e.attributes.importance).collect();
                assert_eq!(once, twice);
            }
        }
    }
}

#[cfg(test)]
mod metadata {
    use tg_core::{DataQuality, RoadClass};
    use tg_osm::{OsmRestriction, OsmWay, RestrictionKind};

    use crate::{rewrite_restrictions, NodeMaps, Restriction};

    use super::fixtures::{construct, line_nodes, tmp};

    #[test]
    fn node_maps_keep_only_graph_nodes() {
        let mut d = line_nodes(3);
        d.add_way(OsmWay::new(100, vec![1, 2, 3], RoadClass::Motorway));
        d.node_ref.insert(1, "12".into());
        d.node_ref.insert(2, "13".into()); // shape point
        d.node_exit_to.insert(3, String::new());
        d.node_name.insert(77, "Nowhere".into()); // not in any way
        let dir = tmp();
        let (b, _) = construct(&d, &dir);
        let maps = NodeMaps::build(&d, b.dedup());

        let (n1, n3) = (b.graph_id(1).unwrap(), b.graph_id(3).unwrap());
        assert_eq!(maps.node_ref(n1), Some("12"));
        assert_eq!(maps.len(), 2);
        // Present-but-empty is distinct from absent.
        assert_eq!(maps.exit_to(n3), Some(""));
        assert_eq!(maps.exit_to(n1), None);
        assert!(maps.contains(n3));
        assert!(!maps.contains(b.graph_id(1).map(|mut g| { g.index = 99; g }).unwrap()));
    }

    fn restriction(nodes: Vec<i64>) -> OsmRestriction {
        OsmRestriction { kind: RestrictionKind::NoLeftTurn, nodes, from_way: 100, to_way: 101 }
    }

    #[test]
    fn restrictions_translate_or_drop() {
        let mut d = line_nodes(5);
        d.add_way(OsmWay::new(100, vec![1, 2, 3], RoadClass::Primary));
        d.add_way(OsmWay::new(101, vec![4, 2, 5], RoadClass::Primary));
        let dir = tmp();
        let (b, _) = construct(&d, &dir);
        let source = vec![
            restriction(vec![1, 2, 5]),
            restriction(vec![1, 2, 99]),
            restriction(vec![3]),
            restriction(vec![3, 2]),
        ];
        let mut q = DataQuality::default();
        let out = rewrite_restrictions(&source, b.dedup(), &mut q);

        assert_eq!(out.len(), 2);
        assert_eq!(q.unmapped_restrictions, 1);
        assert_eq!(q.malformed_restrictions, 1);
        let via = b.graph_id(2).unwrap();
        assert_eq!(out[0].nodes, vec![b.graph_id(1).unwrap(), via, b.graph_id(5).unwrap()]);
        assert_eq!(out[0].anchor(), Some(via));
        assert_eq!(out[0].kind, RestrictionKind::NoLeftTurn);
        assert_eq!(out[1].anchor(), Some(via));

        // Without a via node there is nothing to file the restriction under.
        let lone = Restriction { nodes: vec![via], ..out[0].clone() };
        assert_eq!(lone.anchor(), None);
        assert_eq!(lone.tile(), None);
    }
}

#[cfg(test)]
mod signs {
    use tg_core::{RefPolicy, RoadClass};
    use tg_osm::OsmWay;

    use crate::{exit_signs, resolve_ref, NodeMaps, SignKind};

    use super::fixtures::{construct, line_nodes, tmp};

    #[test]
    fn ref_policies() {
        let w = Some("I 95");
        let r = Some("I 95 North;US 1 South");
        assert_eq!(resolve_ref(w, r, RefPolicy::WayFirst).as_deref(), Some("I 95"));
        assert_eq!(resolve_ref(w, r, RefPolicy::RelationFirst).as_deref(), Some("I 95 North;US 1 South"));
        assert_eq!(resolve_ref(w, r, RefPolicy::Merge).as_deref(), Some("I 95 North"));
        assert_eq!(resolve_ref(Some("I 95;SR 9"), r, RefPolicy::Merge).as_deref(), Some("I 95 North;SR 9"));
        assert_eq!(resolve_ref(None, r, RefPolicy::WayFirst).as_deref(), r);
        assert_eq!(resolve_ref(Some(""), Some("A 1"), RefPolicy::WayFirst).as_deref(), Some("A 1"));
        assert_eq!(resolve_ref(None, None, RefPolicy::Merge), None);
    }

    #[test]
    fn entries_in_order_and_split() {
        let mut d = line_nodes(3);
        d.add_way(OsmWay::new(100, vec![1, 2], RoadClass::Motorway));
        d.node_ref.insert(1, "12".into());
        d.node_exit_to.insert(1, "Downtown".into());
        d.node_name.insert(1, "Broad Street".into());
        let dir = tmp();
        let (b, _) = construct(&d, &dir);
        let maps = NodeMaps::build(&d, b.dedup());
        let node = b.graph_id(1).unwrap();

        let ramp = OsmWay::new(200, vec![1, 3], RoadClass::Motorway)
            .as_link()
            .with_tag("destination:ref", "I 10;;US 90")
            .with_tag("destination:street", "Water St")
            .with_tag("destination", "Mobile; Pensacola");
        let signs = exit_signs(&ramp, node, &maps, RefPolicy::WayFirst);
        let got: Vec<(SignKind, &str)> = signs.iter().map(|s| (s.kind, s.text.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (SignKind::ExitNumber, "12"),
                (SignKind::ExitBranch, "I 10"),
                (SignKind::ExitBranch, "US 90"),
                (SignKind::ExitBranch, "Water St"),
                (SignKind::ExitToward, "Mobile"),
                (SignKind::ExitToward, "Pensacola"),
                (SignKind::ExitName, "Broad Street"),
            ]
        );

        // Way-level text wins over node text; empty text is omitted.
        let tagged = OsmWay::new(201, vec![1, 3], RoadClass::Motorway)
            .as_link()
            .with_tag("junction:ref", "12B")
            .with_tag("destination", "");
        let signs = exit_signs(&tagged, node, &maps, RefPolicy::WayFirst);
        assert_eq!(signs[0].text, "12B");
        assert!(signs.iter().all(|s| s.kind != SignKind::ExitToward));

        // A plain `ref` stands in for `destination:ref` and still beats the
        // relation ref; the way `name` is used when the node has none.
        let bare = NodeMaps::default();
        let plain = OsmWay::new(202, vec![1, 3], RoadClass::Motorway)
            .as_link()
            .with_tag("ref", "I 95")
            .with_tag("name", "Exit Ramp")
            .with_relation_ref("I 95 North");
        let got: Vec<(SignKind, String)> = exit_signs(&plain, node, &bare, RefPolicy::WayFirst)
            .into_iter()
            .map(|s| (s.kind, s.text))
            .collect();
        assert_eq!(
            got,
            vec![(SignKind::ExitBranch, "I 95".to_owned()), (SignKind::ExitName, "Exit Ramp".to_owned())]
        );
        let merged = exit_signs(&plain, node, &bare, RefPolicy::Merge);
        assert_eq!(merged[0].text, "I 95 North");
        // `destination:ref` takes precedence over `ref`.
        let both = plain.with_tag("destination:ref", "US 1");
        assert_eq!(exit_signs(&both, node, &bare, RefPolicy::WayFirst)[0].text, "US 1");
    }

    #[test]
    fn only_links_leaving_exit_nodes_get_signs() {
        let mut d = line_nodes(6);
        d.add_way(OsmWay::new(1, vec![1, 2, 3], RoadClass::Motorway).oneway());
        d.add_way(
            OsmWay::new(2, vec![2, 4], RoadClass::Motorway)
                .oneway()
                .as_link()
                .with_tag("destination", "Airport"),
        );
        d.add_way(
            OsmWay::new(3, vec![5, 2], RoadClass::Motorway)
                .oneway()
                .as_link()
                .with_tag("destination", "Onramp"),
        );
        d.add_way(OsmWay::new(4, vec![4, 6], RoadClass::Primary));
        let dir = tmp();
        let (mut b, _) = construct(&d, &dir);
        let maps = NodeMaps::build(&d, b.dedup());
        let signs = b.assemble_exit_signs(&d, &maps, RefPolicy::WayFirst).unwrap();

        // Off-ramp 2→4 leaves junction 2 and carries its destination.  The
        // on-ramp 5→2 only enters 2 and leaves 5, which is not a junction.
        // At junction 4 the off-ramp is entering, so it is not signed again.
        assert_eq!(signs.len(), 1);
        let (index, entries) = signs.iter().next().unwrap();
        assert_eq!(b.edge(*index).unwrap().source, b.graph_id(2).unwrap());
        assert_eq!(entries[0].text, "Airport");
    }
}

#[cfg(test)]
mod finalize {
    use rustc_hash::FxHashSet;

    use tg_core::{DataQuality, RoadClass};
    use tg_osm::{OsmData, OsmRestriction, OsmWay, RestrictionKind};

    use crate::{assemble_tile, build_graph, BuildError, GraphBuilder, NodeMaps, TiledGraph};

    use super::fixtures::{config, data, tmp, Collect};

    /// Roads spread over four local tiles, a ramp and a restriction.
    fn network() -> OsmData {
        let mut d = data(&[
            (1, 30.69, -88.04),
            (2, 30.69, -87.90),
            (3, 30.69, -87.70),
            (4, 30.80, -87.70),
            (5, 31.10, -87.70),
            (6, 31.10, -88.30),
            (7, 30.70, -87.90),
            (8, 30.71, -87.89),
        ]);
        d.add_way(OsmWay::new(1, vec![1, 2, 3], RoadClass::Primary));
        d.add_way(OsmWay::new(2, vec![3, 4, 5], RoadClass::Secondary));
        d.add_way(OsmWay::new(3, vec![5, 6, 1], RoadClass::Residential));
        d.add_way(OsmWay::new(4, vec![2, 7], RoadClass::Primary).as_link().with_tag("destination", "Airport"));
        d.add_way(OsmWay::new(5, vec![7, 8], RoadClass::Motorway));
        d.restrictions.push(OsmRestriction {
            kind: RestrictionKind::NoUTurn,
            nodes: vec![1, 2, 7],
            from_way: 1,
            to_way: 4,
        });
        d
    }

    #[test]
    fn every_node_and_edge_written_once() {
        let d = network();
        let dir = tmp();
        let writer = Collect::default();
        let summary = build_graph(&d, &config(&dir), &writer).unwrap();

        let tiles = writer.tiles.into_inner().unwrap();
        assert_eq!(tiles.len(), summary.tiles);
        assert!(summary.tiles >= 3);
        assert_eq!(summary.quality.tiles_written, summary.tiles as u64);
        assert_eq!(summary.quality.total_defects(), 0);

        let mut nodes = FxHashSet::default();
        let mut edges = FxHashSet::default();
        for (tile, written) in &tiles {
            for id in &written.nodes {
                assert_eq!(id.tile_id(), *tile);
                assert!(nodes.insert(*id), "node {id} written twice");
            }
            for (index, edge) in &written.edges {
                assert_eq!(edge.source.tile_id(), *tile);
                assert!(edges.insert(*index));
            }
        }
        assert_eq!(nodes.len(), summary.nodes);
        assert_eq!(edges.len(), summary.edges);

        // The restriction is filed with its via node; the ramp carries a sign.
        let with_restriction: Vec<_> = tiles.values().filter(|w| !w.restrictions.is_empty()).collect();
        assert_eq!(with_restriction.len(), 1);
        let r = &with_restriction[0].restrictions[0];
        assert!(with_restriction[0].nodes.contains(&r.nodes[1]));
        let signed: usize = tiles.values().map(|w| w.signs.len()).sum();
        assert_eq!(signed, 1);
    }

    #[test]
    fn failing_tile_is_isolated() {
        let d = network();
        let dir = tmp();
        let first_pass = Collect::default();
        build_graph(&d, &config(&dir), &first_pass).unwrap();
        let tiles: Vec<_> = first_pass.tiles.into_inner().unwrap().into_keys().collect();

        let writer = Collect { fail: Some(tiles[0]), ..Collect::default() };
        let mut cfg = config(&dir);
        cfg.threads = Some(1);
        let summary = build_graph(&d, &cfg, &writer).unwrap();

        assert_eq!(summary.quality.tile_failures, 1);
        assert_eq!(summary.quality.tiles_written, tiles.len() as u64 - 1);
        let written = writer.tiles.into_inner().unwrap();
        assert!(!written.contains_key(&tiles[0]));
        assert_eq!(written.len(), tiles.len() - 1);
    }

    #[test]
    fn panicking_writer_is_isolated() {
        let d = network();
        let dir = tmp();
        let first_pass = Collect::default();
        build_graph(&d, &config(&dir), &first_pass).unwrap();
        let tiles: Vec<_> = first_pass.tiles.into_inner().unwrap().into_keys().collect();

        let writer = Collect { panic: Some(tiles[1]), ..Collect::default() };
        let summary = build_graph(&d, &config(&dir), &writer).unwrap();

        assert_eq!(summary.quality.tile_failures, 1);
        assert_eq!(summary.quality.tiles_written, tiles.len() as u64 - 1);
        let written = writer.tiles.into_inner().unwrap();
        assert!(!written.contains_key(&tiles[1]));
    }

    #[test]
    fn payload_shapes_match_edges() {
        let d = network();
        let dir = tmp();
        let mut q = DataQuality::default();
        let mut b = GraphBuilder::new(&config(&dir)).unwrap();
        b.construct_edges(&d, &mut q).unwrap();
        let maps = NodeMaps::build(&d, b.dedup());
        let graph = b.freeze(maps, Vec::new(), Default::default()).unwrap();

        for tile in graph.tile_ids() {
            let payload = assemble_tile(&graph, tile).unwrap();
            for e in &payload.edges {
                assert_eq!(e.shape.len(), e.edge.attributes.shape_count as usize + 1);
                assert_eq!(e.shape[0], graph.node(e.edge.source).unwrap().pos);
                assert!(e.length_m > 0.0);
            }
        }
    }

    #[test]
    fn frozen_graph_is_shareable() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<TiledGraph>();
    }

    #[test]
    fn edge_file_failure_is_fatal() {
        let dir = tmp();
        let mut cfg = config(&dir);
        cfg.edges_path = dir.path().join("missing/edges.bin");
        let res = build_graph(&network(), &cfg, &Collect::default());
        assert!(matches!(res, Err(BuildError::Sequence(_))));
    }

    #[test]
    fn empty_input_builds_nothing() {
        let dir = tmp();
        let summary = build_graph(&OsmData::new(), &config(&dir), &Collect::default()).unwrap();
        assert_eq!((summary.tiles, summary.nodes, summary.edges), (0, 0, 0));
    }
}
