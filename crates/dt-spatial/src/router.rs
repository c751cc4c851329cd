//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The re-routing subsystem calls routing via the [`Router`] trait, so
//! applications can swap in custom implementations (contraction hierarchies,
//! A*) without touching the framework core.
//!
//! # Ownership model
//!
//! `route` takes `&mut self`: a router may keep scratch buffers (distance
//! arrays, open lists) between queries.  One router instance is never used by
//! two threads at once; the worker pool clones one instance per worker.
//!
//! # Edge-to-edge routing
//!
//! Vehicles live on edges, not nodes, so a query goes from an origin edge to
//! a destination edge.  The returned route starts with the origin edge and
//! ends with the destination edge; its cost includes both.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use dt_core::{EdgeId, NodeId};

use crate::cost::EdgeCost;
use crate::network::RoadNetwork;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: an ordered list of `EdgeId`s and the total
/// cost under the cost function used for the search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Edges to traverse in order, from origin edge to destination edge.
    pub edges: Vec<EdgeId>,
    /// Sum of edge costs in seconds.
    pub total_cost: f64,
}

impl Route {
    /// Build a route and price it under `cost`.
    pub fn priced(network: &RoadNetwork, edges: Vec<EdgeId>, cost: &dyn EdgeCost) -> Self {
        let total_cost = Self::cost_of(network, &edges, cost);
        Self { edges, total_cost }
    }

    /// Total cost of an arbitrary edge sequence under `cost`.
    pub fn cost_of(network: &RoadNetwork, edges: &[EdgeId], cost: &dyn EdgeCost) -> f64 {
        edges.iter().map(|&e| cost.edge_cost(network, e)).sum()
    }

    pub fn origin(&self) -> Option<EdgeId> {
        self.edges.first().copied()
    }

    pub fn destination(&self) -> Option<EdgeId> {
        self.edges.last().copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Contract
///
/// - Deterministic: the same query against the same cost function always
///   returns the same route.
/// - `None` means "no path" (disconnected graph or unknown edge).  It is not
///   an error.
/// - Implementations must be `Send` so each worker thread can own one.
pub trait Router: Send {
    fn route(
        &mut self,
        network: &RoadNetwork,
        from:    EdgeId,
        to:      EdgeId,
        cost:    &dyn EdgeCost,
    ) -> Option<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR road graph.
///
/// Keeps its distance and predecessor arrays between queries so repeated
/// searches on the same network do not reallocate.
#[derive(Clone, Debug, Default)]
pub struct DijkstraRouter {
    dist:      Vec<f64>,
    prev_edge: Vec<EdgeId>,
}

impl DijkstraRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, node_count: usize) {
        self.dist.clear();
        self.dist.resize(node_count, f64::INFINITY);
        self.prev_edge.clear();
        self.prev_edge.resize(node_count, EdgeId::INVALID);
    }
}

impl Router for DijkstraRouter {
    fn route(
        &mut self,
        network: &RoadNetwork,
        from:    EdgeId,
        to:      EdgeId,
        cost:    &dyn EdgeCost,
    ) -> Option<Route> {
        if !network.contains_edge(from) || !network.contains_edge(to) {
            return None;
        }
        if from == to {
            return Some(Route::priced(network, vec![from], cost));
        }

        self.reset(network.node_count());

        let start  = network.edge_to[from.index()];
        let target = network.edge_from[to.index()];
        let origin_cost = cost.edge_cost(network, from);

        self.dist[start.index()] = origin_cost;

        // Min-heap: (cost, node). Reverse makes BinaryHeap (max) behave as min-heap.
        // Secondary key NodeId ensures deterministic tie-breaking.
        let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((Cost(origin_cost), start)));

        while let Some(Reverse((Cost(c), node))) = heap.pop() {
            if node == target {
                let mut edges = self.reconstruct(network, start, target);
                edges.insert(0, from);
                edges.push(to);
                return Some(Route {
                    edges,
                    total_cost: c + cost.edge_cost(network, to),
                });
            }

            // Skip stale heap entries.
            if c > self.dist[node.index()] {
                continue;
            }

            for edge in network.out_edges(node) {
                let neighbor = network.edge_to[edge.index()];
                let new_cost = c + cost.edge_cost(network, edge);

                if new_cost < self.dist[neighbor.index()] {
                    self.dist[neighbor.index()] = new_cost;
                    self.prev_edge[neighbor.index()] = edge;
                    heap.push(Reverse((Cost(new_cost), neighbor)));
                }
            }
        }

        None
    }
}

impl DijkstraRouter {
    /// Walk `prev_edge` from `target` back to `start`.
    fn reconstruct(&self, network: &RoadNetwork, start: NodeId, target: NodeId) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        let mut cur = target;
        while cur != start {
            let e = self.prev_edge[cur.index()];
            if e == EdgeId::INVALID {
                break;
            }
            edges.push(e);
            cur = network.edge_from[e.index()];
        }
        edges.reverse();
        edges
    }
}

// ── Heap key ──────────────────────────────────────────────────────────────────

/// `f64` with a total order so it can live in a `BinaryHeap`.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
