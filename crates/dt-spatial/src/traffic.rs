//! Live per-edge speed measurements.
//!
//! The movement model records one sample per vehicle per edge per step; the
//! cost cache reads the mean at refresh time and the owner clears the
//! accumulators afterwards.  An edge with no samples since the last clear
//! reports `None`, meaning "no recent measurement".

use dt_core::EdgeId;

/// Accumulated speed samples, indexed by `EdgeId`.
#[derive(Clone, Debug, Default)]
pub struct EdgeSpeeds {
    sum_mps: Vec<f64>,
    samples: Vec<u32>,
}

impl EdgeSpeeds {
    /// Create empty accumulators for `edge_count` edges.
    pub fn new(edge_count: usize) -> Self {
        Self {
            sum_mps: vec![0.0; edge_count],
            samples: vec![0; edge_count],
        }
    }

    pub fn edge_count(&self) -> usize {
        self.samples.len()
    }

    /// Add one speed observation for `edge`.  Out-of-range edges are ignored.
    #[inline]
    pub fn record(&mut self, edge: EdgeId, speed_mps: f64) {
        if let (Some(sum), Some(n)) = (self.sum_mps.get_mut(edge.index()), self.samples.get_mut(edge.index())) {
            *sum += speed_mps;
            *n += 1;
        }
    }

    /// Mean observed speed on `edge` since the last [`clear`](Self::clear).
    pub fn mean_speed(&self, edge: EdgeId) -> Option<f64> {
        match self.samples.get(edge.index()) {
            Some(&n) if n > 0 => Some(self.sum_mps[edge.index()] / n as f64),
            _ => None,
        }
    }

    /// Number of samples recorded for `edge` since the last clear.
    pub fn sample_count(&self, edge: EdgeId) -> u32 {
        self.samples.get(edge.index()).copied().unwrap_or(0)
    }

    /// Reset all accumulators, keeping allocations.
    pub fn clear(&mut self) {
        self.sum_mps.fill(0.0);
        self.samples.fill(0);
    }
}
