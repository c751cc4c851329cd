//! Edge-by-edge movement with a simple congestion model.
//!
//! # Movement model
//!
//! 1. [`MobilityEngine::try_insert`] puts a pending vehicle on the first edge
//!    of its route if that edge has room.
//! 2. On entering an edge the vehicle's speed is fixed from the edge's speed
//!    limit and how full the edge is; the exit tick follows from the length.
//! 3. [`MobilityEngine::advance`] moves every vehicle whose exit tick has
//!    come onto its next edge, if that edge has room.  Otherwise it queues.
//!    A vehicle that leaves the last edge of its route arrives.
//!
//! Every driving vehicle reports one speed sample per step into
//! [`EdgeSpeeds`]: its edge speed while moving, 0 while queueing.  Those
//! samples are what the rerouting cost cache turns into edge weights.
//!
//! Vehicles are processed in `VehicleId` order so runs are reproducible.

use dt_core::{EdgeId, SimClock, Tick, VehicleId};
use dt_spatial::{EdgeSpeeds, RoadNetwork};
use tracing::trace;

use crate::{MobilityError, MobilityResult, MovementState, VehicleStore};

// ── Congestion model ──────────────────────────────────────────────────────────

/// Speed on an edge as a function of its load.
///
/// `speed = limit * max(1 - jam_factor * load, min_speed_share)` where
/// `load = occupancy / capacity`, capped at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CongestionModel {
    pub jam_factor:      f64,
    pub min_speed_share: f64,
}

impl Default for CongestionModel {
    fn default() -> Self {
        Self { jam_factor: 0.9, min_speed_share: 0.05 }
    }
}

impl CongestionModel {
    pub fn speed(&self, network: &RoadNetwork, edge: EdgeId, occupancy: u32) -> f64 {
        let i = edge.index();
        let capacity = network.edge_capacity[i].max(1) as f64;
        let load = (occupancy as f64 / capacity).min(1.0);
        let share = (1.0 - self.jam_factor * load).max(self.min_speed_share);
        network.edge_speed_limit_mps[i] as f64 * share
    }
}

/// Outcome of an insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    /// The entry edge is full.
    Blocked,
}

// ── MobilityEngine ────────────────────────────────────────────────────────────

pub struct MobilityEngine {
    pub store: VehicleStore,
    pub model: CongestionModel,
}

impl MobilityEngine {
    pub fn new(edge_count: usize) -> Self {
        Self::with_model(edge_count, CongestionModel::default())
    }

    pub fn with_model(edge_count: usize, model: CongestionModel) -> Self {
        Self { store: VehicleStore::new(edge_count), model }
    }

    /// Try to put `vehicle` on the first edge of its route at `now`.
    pub fn try_insert(
        &mut self,
        vehicle: VehicleId,
        network: &RoadNetwork,
        clock:   &SimClock,
        now:     Tick,
    ) -> MobilityResult<Insertion> {
        match self.store.state(vehicle) {
            None => return Err(MobilityError::VehicleNotFound(vehicle)),
            Some(MovementState::Pending) => {}
            Some(_) => return Err(MobilityError::AlreadyInserted(vehicle)),
        }
        let Some(&entry) = self.store.route(vehicle).first() else {
            return Err(MobilityError::InvalidRoute { vehicle, reason: "route is empty".into() });
        };
        if !self.store.has_room(network, entry) {
            trace!(%vehicle, %entry, "insertion blocked");
            return Ok(Insertion::Blocked);
        }
        self.enter(vehicle, 0, network, clock, now);
        Ok(Insertion::Inserted)
    }

    /// Advance every driving vehicle by one step and record speed samples.
    ///
    /// Returns the vehicles that arrived at `now`, in id order.
    pub fn advance(
        &mut self,
        network: &RoadNetwork,
        clock:   &SimClock,
        now:     Tick,
        speeds:  &mut EdgeSpeeds,
    ) -> Vec<VehicleId> {
        let mut arrived = Vec::new();
        for i in 0..self.store.len() {
            let vehicle = VehicleId(i as u32);
            let MovementState::Driving { route_idx, edge_exit, speed_mps, .. } = self.store.states[i] else {
                continue;
            };
            let edge = self.store.routes[i][route_idx];

            if now < edge_exit {
                speeds.record(edge, speed_mps);
                continue;
            }

            match self.store.routes[i].get(route_idx + 1).copied() {
                None => {
                    speeds.record(edge, speed_mps);
                    self.store.release(edge);
                    self.store.states[i] = MovementState::Arrived(now);
                    arrived.push(vehicle);
                }
                Some(next) if self.store.has_room(network, next) => {
                    speeds.record(edge, speed_mps);
                    self.store.release(edge);
                    self.enter(vehicle, route_idx + 1, network, clock, now);
                }
                Some(_) => speeds.record(edge, 0.0),
            }
        }
        arrived
    }

    fn enter(&mut self, vehicle: VehicleId, route_idx: usize, network: &RoadNetwork, clock: &SimClock, now: Tick) {
        let edge = self.store.routes[vehicle.index()][route_idx];
        let occupancy = self.store.occupy(edge);
        let speed_mps = self.model.speed(network, edge, occupancy);
        let secs = network.edge_length_m[edge.index()] as f64 / speed_mps;
        let ticks = clock.ticks_for_secs(secs).max(1);
        self.store.states[vehicle.index()] = MovementState::Driving {
            route_idx,
            entered: now,
            edge_exit: now + ticks,
            speed_mps,
        };
    }
}
