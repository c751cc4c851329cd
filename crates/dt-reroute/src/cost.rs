//! Shared edge-weight table.
//!
//! # Snapshots
//!
//! Weights live behind an `Arc<Vec<f64>>`.  [`CostCache::snapshot`] hands
//! out a clone of the `Arc`, and [`CostCache::refresh`] builds a complete new
//! table before swapping it in.  A search batch therefore reads one table
//! from start to finish, and a view taken before a refresh keeps seeing the
//! old weights.
//!
//! The registry is the only writer and only refreshes between batches.

use std::sync::Arc;

use dt_core::{EdgeId, Tick};
use dt_spatial::{EdgeCost, EdgeSpeeds, RoadNetwork};
use tracing::{debug, info};

// ── CostCache ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CostCache {
    weights:           Arc<Vec<f64>>,
    /// Speed each weight was derived from (smoothed and clamped).
    speeds:            Vec<f64>,
    last_refresh:      Option<Tick>,
    initialized:       bool,
    adaptation_weight: f64,
    min_speed_mps:     f64,
}

impl CostCache {
    /// Create an empty, uninitialized cache.
    ///
    /// `adaptation_weight` is the share of the previous speed kept when a
    /// new measurement arrives; `min_speed_mps` bounds weights from above.
    pub fn new(adaptation_weight: f64, min_speed_mps: f64) -> Self {
        Self {
            weights: Arc::new(Vec::new()),
            speeds: Vec::new(),
            last_refresh: None,
            initialized: false,
            adaptation_weight,
            min_speed_mps,
        }
    }

    /// Fill the table with free-flow travel times.
    ///
    /// Only the first call does anything; returns `true` if it did.
    pub fn initialize(&mut self, network: &RoadNetwork, now: Tick) -> bool {
        if self.initialized {
            return false;
        }
        self.speeds = network
            .edge_speed_limit_mps
            .iter()
            .map(|&v| v as f64)
            .collect();
        self.weights = Arc::new(network.edges().map(|e| network.free_flow_secs(e)).collect());
        self.last_refresh = Some(now);
        self.initialized = true;
        info!(edges = network.edge_count(), %now, "edge cost cache initialized");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Recompute weights from the mean speeds observed since the last
    /// refresh and publish them as a new table.
    ///
    /// Edges without a measurement keep their previous weight.  The speed
    /// used is never below `min_speed_mps`, so every weight stays finite and
    /// positive.
    pub fn refresh(&mut self, network: &RoadNetwork, observed: &EdgeSpeeds, now: Tick) {
        self.initialize(network, now);

        let mut weights = (*self.weights).clone();
        let mut updated = 0usize;
        let n = weights.len().min(network.edge_count());
        for i in 0..n {
            let edge = EdgeId(i as u32);
            let Some(speed) = observed.mean_speed(edge).filter(|v| v.is_finite()) else {
                continue;
            };
            let smoothed = self.adaptation_weight * self.speeds[i]
                + (1.0 - self.adaptation_weight) * speed;
            let speed = smoothed.max(self.min_speed_mps);
            self.speeds[i] = speed;
            weights[i] = network.edge_length_m[i] as f64 / speed;
            updated += 1;
        }

        self.weights = Arc::new(weights);
        self.last_refresh = Some(now);
        debug!(%now, updated, "edge cost cache refreshed");
    }

    /// Immutable view of the current table.  Cheap: shares the table.
    pub fn snapshot(&self) -> CostView {
        CostView { weights: Arc::clone(&self.weights) }
    }

    /// Current weight of `edge`, if the table covers it.
    pub fn weight(&self, edge: EdgeId) -> Option<f64> {
        self.weights.get(edge.index()).copied()
    }

    /// Speed the current weight of `edge` was derived from.
    pub fn speed(&self, edge: EdgeId) -> Option<f64> {
        self.speeds.get(edge.index()).copied()
    }

    pub fn last_refresh(&self) -> Option<Tick> {
        self.last_refresh
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

// ── CostView ──────────────────────────────────────────────────────────────────

/// A frozen cost table, passed to routers as their [`EdgeCost`].
///
/// Edges outside the table fall back to free-flow travel time.
#[derive(Clone, Debug)]
pub struct CostView {
    weights: Arc<Vec<f64>>,
}

impl CostView {
    pub fn weight(&self, edge: EdgeId) -> Option<f64> {
        self.weights.get(edge.index()).copied()
    }

    /// `true` if both views share the same underlying table.
    pub fn same_table(&self, other: &CostView) -> bool {
        Arc::ptr_eq(&self.weights, &other.weights)
    }
}

impl EdgeCost for CostView {
    #[inline]
    fn edge_cost(&self, network: &RoadNetwork, edge: EdgeId) -> f64 {
        match self.weights.get(edge.index()) {
            Some(&w) => w,
            None => network.free_flow_secs(edge),
        }
    }
}
