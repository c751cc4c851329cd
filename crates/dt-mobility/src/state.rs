//! Per-vehicle movement state.

use dt_core::Tick;

/// Where a vehicle is in its trip.
///
/// A driving vehicle occupies `route[route_idx]` from `entered` until it can
/// leave at `edge_exit` or later.  It leaves only when the next edge has
/// room, so `edge_exit` may lie in the past while it queues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementState {
    /// Defined but not yet inserted.
    Pending,
    Driving {
        route_idx: usize,
        entered:   Tick,
        edge_exit: Tick,
        /// Speed fixed when the edge was entered.
        speed_mps: f64,
    },
    /// Reached the end of its route at the given tick.
    Arrived(Tick),
}

impl MovementState {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, MovementState::Pending)
    }

    #[inline]
    pub fn is_driving(&self) -> bool {
        matches!(self, MovementState::Driving { .. })
    }

    #[inline]
    pub fn is_arrived(&self) -> bool {
        matches!(self, MovementState::Arrived(_))
    }

    /// Fraction of the current edge covered at `now`, in `[0.0, 1.0]`.
    ///
    /// `0.0` before insertion, `1.0` after arrival or while queueing.
    pub fn progress(&self, now: Tick) -> f32 {
        match *self {
            MovementState::Pending => 0.0,
            MovementState::Arrived(_) => 1.0,
            MovementState::Driving { entered, edge_exit, .. } => {
                if edge_exit <= entered {
                    return 1.0;
                }
                let elapsed = now.saturating_since(entered) as f32;
                let total = (edge_exit - entered) as f32;
                (elapsed / total).min(1.0)
            }
        }
    }
}
