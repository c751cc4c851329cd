//! Unit tests for dt-spatial.
//!
//! All tests use a hand-crafted network.

#[cfg(test)]
mod helpers {
    use dt_core::EdgeId;

    use crate::{RoadNetwork, RoadNetworkBuilder};

    /// Two parallel corridors between an origin edge and a destination edge.
    ///
    /// ```text
    ///              ┌─f0─▶ n1 ─f1─▶ n2 ─f2─┐
    ///   n0 ─entry─▶ n                       ▶ m ─exit─▶ n5
    ///              └─s0─▶ n3 ─s1─▶ n4 ─s2─┘
    /// ```
    ///
    /// All edges are one-way.  Free-flow: fast branch 3 × 10 s, slow branch
    /// 3 × 20 s.
    pub struct Corridors {
        pub net:     RoadNetwork,
        pub entry:   EdgeId,
        pub fast:    [EdgeId; 3],
        pub slow:    [EdgeId; 3],
        pub exit:    EdgeId,
    }

    pub fn corridors() -> Corridors {
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node();
        let n = b.add_node();
        let n1 = b.add_node();
        let n2 = b.add_node();
        let n3 = b.add_node();
        let n4 = b.add_node();
        let m = b.add_node();
        let n5 = b.add_node();

        // 100 m at 10 m/s = 10 s; 200 m at 10 m/s = 20 s.
        let entry = b.add_directed_edge(n0, n, 100.0, 10.0).unwrap();
        let f0 = b.add_directed_edge(n, n1, 100.0, 10.0).unwrap();
        let f1 = b.add_directed_edge(n1, n2, 100.0, 10.0).unwrap();
        let f2 = b.add_directed_edge(n2, m, 100.0, 10.0).unwrap();
        let s0 = b.add_directed_edge(n, n3, 200.0, 10.0).unwrap();
        let s1 = b.add_directed_edge(n3, n4, 200.0, 10.0).unwrap();
        let s2 = b.add_directed_edge(n4, m, 200.0, 10.0).unwrap();
        let exit = b.add_directed_edge(m, n5, 100.0, 10.0).unwrap();

        Corridors {
            net: b.build(),
            entry,
            fast: [f0, f1, f2],
            slow: [s0, s1, s2],
            exit,
        }
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use dt_core::{EdgeId, NodeId};

    use crate::{RoadNetworkBuilder, SpatialError};

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert!(net.is_empty());
    }

    #[test]
    fn edge_ids_follow_insertion_order() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node();
        let c = b.add_node();
        // Insert the c → a edge first so sorting by source would reorder it.
        let ca = b.add_directed_edge(c, a, 50.0, 5.0).unwrap();
        let ac = b.add_directed_edge(a, c, 100.0, 10.0).unwrap();
        let net = b.build();
        assert_eq!(ca, EdgeId(0));
        assert_eq!(ac, EdgeId(1));
        assert_eq!(net.edge_from[ca.index()], c);
        assert_eq!(net.out_edges(a).collect::<Vec<_>>(), vec![ac]);
        assert_eq!(net.out_edges(c).collect::<Vec<_>>(), vec![ca]);
    }

    #[test]
    fn csr_out_degrees() {
        let g = super::helpers::corridors();
        assert_eq!(g.net.out_degree(NodeId(1)), 2); // fork
        assert_eq!(g.net.out_degree(NodeId(7)), 0); // sink after the exit edge
        for e in g.net.out_edges(NodeId(1)) {
            assert_eq!(g.net.edge_from[e.index()], NodeId(1));
        }
    }

    #[test]
    fn rejects_unknown_node() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node();
        let err = b.add_directed_edge(a, NodeId(9), 10.0, 10.0).unwrap_err();
        assert!(matches!(err, SpatialError::NodeNotFound(NodeId(9))));
    }

    #[test]
    fn rejects_non_positive_length_and_speed() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node();
        let c = b.add_node();
        assert!(b.add_directed_edge(a, c, 0.0, 10.0).is_err());
        assert!(b.add_directed_edge(a, c, 10.0, -1.0).is_err());
        assert!(b.add_directed_edge(a, c, f32::NAN, 10.0).is_err());
        assert_eq!(b.edge_count(), 0);
    }

    #[test]
    fn capacity_from_length() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node();
        let c = b.add_node();
        let long = b.add_directed_edge(a, c, 75.0, 10.0).unwrap();
        let short = b.add_directed_edge(c, a, 3.0, 10.0).unwrap();
        let net = b.build();
        assert_eq!(net.edge_capacity[long.index()], 10);
        assert_eq!(net.edge_capacity[short.index()], 1);
    }

    #[test]
    fn free_flow_secs() {
        let g = super::helpers::corridors();
        assert!((g.net.free_flow_secs(g.slow[0]) - 20.0).abs() < 1e-9);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use dt_core::EdgeId;

    use crate::{DijkstraRouter, EdgeCost, FreeFlowCost, RoadNetwork, Route, Router};

    /// Free flow, except one edge that is made very expensive.
    struct Jammed(EdgeId);

    impl EdgeCost for Jammed {
        fn edge_cost(&self, network: &RoadNetwork, edge: EdgeId) -> f64 {
            if edge == self.0 { 1_000.0 } else { network.free_flow_secs(edge) }
        }
    }

    #[test]
    fn picks_fast_corridor_at_free_flow() {
        let g = super::helpers::corridors();
        let route = DijkstraRouter::new()
            .route(&g.net, g.entry, g.exit, &FreeFlowCost)
            .unwrap();
        let mut expected = vec![g.entry];
        expected.extend(g.fast);
        expected.push(g.exit);
        assert_eq!(route.edges, expected);
        // entry 10 + fast 3 × 10 + exit 10
        assert!((route.total_cost - 50.0).abs() < 1e-9);
    }

    #[test]
    fn avoids_jammed_edge() {
        let g = super::helpers::corridors();
        let route = DijkstraRouter::new()
            .route(&g.net, g.entry, g.exit, &Jammed(g.fast[1]))
            .unwrap();
        assert!(route.edges.contains(&g.slow[1]));
        assert!(!route.edges.contains(&g.fast[1]));
        assert!((route.total_cost - 80.0).abs() < 1e-9);
    }

    #[test]
    fn same_origin_and_destination() {
        let g = super::helpers::corridors();
        let route = DijkstraRouter::new()
            .route(&g.net, g.entry, g.entry, &FreeFlowCost)
            .unwrap();
        assert_eq!(route.edges, vec![g.entry]);
        assert!((route.total_cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn adjacent_edges() {
        let g = super::helpers::corridors();
        let route = DijkstraRouter::new()
            .route(&g.net, g.entry, g.fast[0], &FreeFlowCost)
            .unwrap();
        assert_eq!(route.edges, vec![g.entry, g.fast[0]]);
    }

    #[test]
    fn unreachable_returns_none() {
        let g = super::helpers::corridors();
        // All edges are one-way; nothing leads back to the entry edge.
        let mut router = DijkstraRouter::new();
        assert!(router.route(&g.net, g.exit, g.entry, &FreeFlowCost).is_none());
    }

    #[test]
    fn unknown_edge_returns_none() {
        let g = super::helpers::corridors();
        let mut router = DijkstraRouter::new();
        assert!(router.route(&g.net, g.entry, EdgeId(999), &FreeFlowCost).is_none());
        assert!(router.route(&g.net, EdgeId::INVALID, g.exit, &FreeFlowCost).is_none());
    }

    #[test]
    fn scratch_reuse_does_not_leak_between_queries() {
        let g = super::helpers::corridors();
        let mut router = DijkstraRouter::new();
        let jammed = router.route(&g.net, g.entry, g.exit, &Jammed(g.fast[1])).unwrap();
        let free = router.route(&g.net, g.entry, g.exit, &FreeFlowCost).unwrap();
        let fresh = DijkstraRouter::new().route(&g.net, g.entry, g.exit, &FreeFlowCost).unwrap();
        assert_ne!(jammed.edges, free.edges);
        assert_eq!(free, fresh);
    }

    #[test]
    fn empty_network_has_no_routes() {
        let net = RoadNetwork::empty();
        assert!(DijkstraRouter::new().route(&net, EdgeId(0), EdgeId(0), &FreeFlowCost).is_none());
    }

    #[test]
    fn cost_of_prices_arbitrary_paths() {
        let g = super::helpers::corridors();
        let slow: Vec<EdgeId> = g.slow.to_vec();
        assert!((Route::cost_of(&g.net, &slow, &FreeFlowCost) - 60.0).abs() < 1e-9);
        let priced = Route::priced(&g.net, slow, &FreeFlowCost);
        assert_eq!(priced.origin(), Some(g.slow[0]));
        assert_eq!(priced.destination(), Some(g.slow[2]));
    }
}

// ── Live speeds ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod traffic {
    use dt_core::EdgeId;

    use crate::EdgeSpeeds;

    #[test]
    fn mean_of_samples() {
        let mut s = EdgeSpeeds::new(3);
        s.record(EdgeId(1), 10.0);
        s.record(EdgeId(1), 20.0);
        assert_eq!(s.mean_speed(EdgeId(1)), Some(15.0));
        assert_eq!(s.sample_count(EdgeId(1)), 2);
        assert_eq!(s.mean_speed(EdgeId(0)), None);
    }

    #[test]
    fn clear_forgets_samples() {
        let mut s = EdgeSpeeds::new(2);
        s.record(EdgeId(0), 5.0);
        s.clear();
        assert_eq!(s.mean_speed(EdgeId(0)), None);
        assert_eq!(s.edge_count(), 2);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut s = EdgeSpeeds::new(1);
        s.record(EdgeId(7), 5.0);
        assert_eq!(s.mean_speed(EdgeId(7)), None);
    }
}
