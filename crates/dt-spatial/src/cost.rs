//! Edge cost functions consumed by routers.
//!
//! A router never decides what an edge "costs"; it asks an [`EdgeCost`].
//! The re-routing subsystem passes an immutable snapshot of its cost table,
//! so the same search always sees the same weights no matter which worker
//! thread runs it.

use dt_core::EdgeId;

use crate::RoadNetwork;

/// Traversal cost of an edge, in seconds.
///
/// Implementations must return a finite, strictly positive value for every
/// edge of `network`.  They are shared by reference across routing workers,
/// hence the `Sync` bound.
pub trait EdgeCost: Sync {
    fn edge_cost(&self, network: &RoadNetwork, edge: EdgeId) -> f64;
}

/// Free-flow travel time: `length / speed limit`.
#[derive(Copy, Clone, Debug, Default)]
pub struct FreeFlowCost;

impl EdgeCost for FreeFlowCost {
    #[inline]
    fn edge_cost(&self, network: &RoadNetwork, edge: EdgeId) -> f64 {
        network.free_flow_secs(edge)
    }
}
