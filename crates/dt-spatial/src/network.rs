//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, the ids of its outgoing edges occupy the slice:
//!
//! ```text
//! out_edge_ids[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Edge ids are assigned in insertion order, so callers can hold on to the
//! `EdgeId` returned by [`RoadNetworkBuilder::add_directed_edge`].  All edge
//! arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_speed_limit_mps`,
//! `edge_capacity`) are indexed by `EdgeId`.  Iteration over a node's
//! outgoing edges is a contiguous scan of `out_edge_ids`: ideal for
//! Dijkstra's inner loop.
//!
//! The network is immutable once built and is shared read-only by every
//! routing worker.  Live traffic state lives in [`EdgeSpeeds`](crate::EdgeSpeeds).

use dt_core::{EdgeId, NodeId};

use crate::{SpatialError, SpatialResult};

/// Road space one stopped vehicle occupies (length + gap), in metres.
/// Used to derive per-edge storage capacity.
pub const VEHICLE_SPACE_M: f32 = 7.5;

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer into `out_edge_ids`.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Outgoing edge ids grouped by source node.
    pub out_edge_ids: Vec<EdgeId>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    /// Source node of each edge.  Required for route reconstruction
    /// (trace `prev_edge` back to the source).
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Length of each edge in metres.
    pub edge_length_m: Vec<f32>,

    /// Legal speed limit in metres per second.
    pub edge_speed_limit_mps: Vec<f32>,

    /// How many vehicles fit on the edge (all lanes).  At least 1.
    pub edge_capacity: Vec<u32>,

    node_count: usize,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    ///
    /// Any routing request against an empty network returns `None`.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// `true` if `edge` indexes an existing edge.
    #[inline]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        edge.index() < self.edge_count()
    }

    /// Iterator over every `EdgeId` in the network, in id order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edge_count() as u32).map(EdgeId)
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous slice scan: no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        self.out_edge_ids[start..end].iter().copied()
    }

    /// Out-degree of `node` (number of outgoing edges).
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    // ── Edge attributes ───────────────────────────────────────────────────

    /// Free-flow traversal time of `edge` in seconds: `length / speed limit`.
    #[inline]
    pub fn free_flow_secs(&self, edge: EdgeId) -> f64 {
        self.edge_length_m[edge.index()] as f64 / self.edge_speed_limit_mps[edge.index()] as f64
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// Edges may be added in any order; `build()` groups them by source node to
/// construct the CSR arrays.
///
/// # Example
///
/// ```
/// use dt_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node();
/// let c = b.add_node();
/// let (ac, ca) = b.add_road(a, c, 1_200.0, 13.9).unwrap();
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// assert_eq!(net.edge_to[ac.index()], c);
/// assert_eq!(net.edge_to[ca.index()], a);
/// ```
pub struct RoadNetworkBuilder {
    node_count: usize,
    raw_edges:  Vec<RawEdge>,
}

struct RawEdge {
    from:            NodeId,
    to:              NodeId,
    length_m:        f32,
    speed_limit_mps: f32,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { node_count: 0, raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of edges.
    pub fn with_capacity(edges: usize) -> Self {
        Self { node_count: 0, raw_edges: Vec::with_capacity(edges) }
    }

    /// Add a junction and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.node_count as u32);
        self.node_count += 1;
        id
    }

    /// Add a **directed** edge from `from` to `to` and return its `EdgeId`.
    ///
    /// - `length_m`: physical length in metres, must be positive.
    /// - `speed_limit_mps`: legal speed in m/s, must be positive.
    pub fn add_directed_edge(
        &mut self,
        from:            NodeId,
        to:              NodeId,
        length_m:        f32,
        speed_limit_mps: f32,
    ) -> SpatialResult<EdgeId> {
        for node in [from, to] {
            if node.index() >= self.node_count {
                return Err(SpatialError::NodeNotFound(node));
            }
        }
        if !(length_m.is_finite() && length_m > 0.0) {
            return Err(SpatialError::InvalidEdge { from, to, reason: "length must be positive" });
        }
        if !(speed_limit_mps.is_finite() && speed_limit_mps > 0.0) {
            return Err(SpatialError::InvalidEdge { from, to, reason: "speed limit must be positive" });
        }
        let id = EdgeId(self.raw_edges.len() as u32);
        self.raw_edges.push(RawEdge { from, to, length_m, speed_limit_mps });
        Ok(id)
    }

    /// Convenience: add edges in **both directions** for an undirected road
    /// segment.  Returns `(a → b, b → a)`.
    pub fn add_road(
        &mut self,
        a:               NodeId,
        b:               NodeId,
        length_m:        f32,
        speed_limit_mps: f32,
    ) -> SpatialResult<(EdgeId, EdgeId)> {
        let ab = self.add_directed_edge(a, b, length_m, speed_limit_mps)?;
        let ba = self.add_directed_edge(b, a, length_m, speed_limit_mps)?;
        Ok((ab, ba))
    }

    pub fn node_count(&self) -> usize { self.node_count }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(E log E) for grouping edges by source node.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.node_count;
        let raw = self.raw_edges;

        // Stable sort keeps insertion order among a node's outgoing edges,
        // which in turn fixes Dijkstra's relaxation order.
        let mut out_edge_ids: Vec<EdgeId> = (0..raw.len() as u32).map(EdgeId).collect();
        out_edge_ids.sort_by_key(|e| raw[e.index()].from.0);

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        RoadNetwork {
            node_out_start,
            out_edge_ids,
            edge_from:            raw.iter().map(|e| e.from).collect(),
            edge_to:              raw.iter().map(|e| e.to).collect(),
            edge_length_m:        raw.iter().map(|e| e.length_m).collect(),
            edge_speed_limit_mps: raw.iter().map(|e| e.speed_limit_mps).collect(),
            edge_capacity:        raw
                .iter()
                .map(|e| ((e.length_m / VEHICLE_SPACE_M).floor() as u32).max(1))
                .collect(),
            node_count,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
