//! The `VehicleStore`: vehicle definitions, committed routes, movement
//! state, and per-edge occupancy.

use dt_core::{EdgeId, Tick, VehicleId};
use dt_reroute::Fleet;
use dt_spatial::{RoadNetwork, Route};
use tracing::debug;

use crate::{MobilityError, MobilityResult, MovementState};

/// What a vehicle is asked to do: enter at `entry_edge` no earlier than
/// `depart`, and drive to the end of `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleDef {
    pub depart:      Tick,
    pub entry_edge:  EdgeId,
    pub destination: EdgeId,
}

/// Per-vehicle storage, indexed by `VehicleId`.
///
/// Ids are handed out sequentially by [`define`](Self::define).  A route
/// always covers the whole trip; `route_idx` in the movement state marks the
/// edge the vehicle is on.
pub struct VehicleStore {
    pub defs:   Vec<VehicleDef>,
    pub states: Vec<MovementState>,
    pub routes: Vec<Vec<EdgeId>>,
    /// Vehicles currently on each edge, indexed by `EdgeId`.
    occupancy:  Vec<u32>,
}

impl VehicleStore {
    pub fn new(edge_count: usize) -> Self {
        Self {
            defs:      Vec::new(),
            states:    Vec::new(),
            routes:    Vec::new(),
            occupancy: vec![0; edge_count],
        }
    }

    /// Add a vehicle with its initial route and return its id.
    ///
    /// The route must start at the entry edge, end at the destination, and
    /// only use edges of `network`.
    pub fn define(
        &mut self,
        def:     VehicleDef,
        route:   Vec<EdgeId>,
        network: &RoadNetwork,
    ) -> MobilityResult<VehicleId> {
        let vehicle = VehicleId(self.defs.len() as u32);
        if let Some(&bad) = route.iter().find(|&&e| !network.contains_edge(e)) {
            return Err(MobilityError::UnknownEdge(bad));
        }
        if route.first() != Some(&def.entry_edge) || route.last() != Some(&def.destination) {
            return Err(MobilityError::InvalidRoute {
                vehicle,
                reason: format!(
                    "must run from {} to {}, got {} edges",
                    def.entry_edge,
                    def.destination,
                    route.len()
                ),
            });
        }
        self.defs.push(def);
        self.states.push(MovementState::Pending);
        self.routes.push(route);
        Ok(vehicle)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn def(&self, vehicle: VehicleId) -> Option<&VehicleDef> {
        self.defs.get(vehicle.index())
    }

    pub fn state(&self, vehicle: VehicleId) -> Option<&MovementState> {
        self.states.get(vehicle.index())
    }

    /// The full committed route, including edges already driven.
    pub fn route(&self, vehicle: VehicleId) -> &[EdgeId] {
        self.routes.get(vehicle.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edge the vehicle is on, if driving.
    pub fn current_edge(&self, vehicle: VehicleId) -> Option<EdgeId> {
        match self.states.get(vehicle.index())? {
            MovementState::Driving { route_idx, .. } => self.routes[vehicle.index()].get(*route_idx).copied(),
            _ => None,
        }
    }

    pub fn occupancy(&self, edge: EdgeId) -> u32 {
        self.occupancy.get(edge.index()).copied().unwrap_or(0)
    }

    /// `true` if one more vehicle fits on `edge`.
    pub fn has_room(&self, network: &RoadNetwork, edge: EdgeId) -> bool {
        network.contains_edge(edge) && self.occupancy(edge) < network.edge_capacity[edge.index()]
    }

    /// Pending vehicles whose departure time has come, in id order.
    pub fn due_for_insertion(&self, now: Tick) -> Vec<VehicleId> {
        self.defs
            .iter()
            .zip(&self.states)
            .enumerate()
            .filter(|(_, (def, state))| state.is_pending() && def.depart <= now)
            .map(|(i, _)| VehicleId(i as u32))
            .collect()
    }

    pub fn driving_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_driving()).count()
    }

    pub fn arrived_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_arrived()).count()
    }

    pub(crate) fn occupy(&mut self, edge: EdgeId) -> u32 {
        let slot = &mut self.occupancy[edge.index()];
        *slot += 1;
        *slot
    }

    pub(crate) fn release(&mut self, edge: EdgeId) {
        let slot = &mut self.occupancy[edge.index()];
        *slot = slot.saturating_sub(1);
    }
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

impl Fleet for VehicleStore {
    fn contains(&self, vehicle: VehicleId) -> bool {
        self.states.get(vehicle.index()).is_some_and(|s| !s.is_arrived())
    }

    fn is_inserted(&self, vehicle: VehicleId) -> bool {
        self.states.get(vehicle.index()).is_some_and(|s| s.is_driving())
    }

    fn origin_edge(&self, vehicle: VehicleId) -> Option<EdgeId> {
        match self.states.get(vehicle.index())? {
            MovementState::Pending => Some(self.defs[vehicle.index()].entry_edge),
            MovementState::Driving { .. } => self.current_edge(vehicle),
            MovementState::Arrived(_) => None,
        }
    }

    fn destination(&self, vehicle: VehicleId) -> Option<EdgeId> {
        self.def(vehicle).map(|d| d.destination)
    }

    fn remaining_route(&self, vehicle: VehicleId) -> &[EdgeId] {
        let route = self.route(vehicle);
        match self.states.get(vehicle.index()) {
            Some(MovementState::Pending) => route,
            Some(MovementState::Driving { route_idx, .. }) => route.get(*route_idx..).unwrap_or(&[]),
            _ => &[],
        }
    }

    fn replace_route(&mut self, vehicle: VehicleId, route: Route) {
        if route.origin() != self.origin_edge(vehicle) {
            debug!(%vehicle, "replacement route does not start at the vehicle's edge; ignored");
            return;
        }
        let keep = match self.states[vehicle.index()] {
            MovementState::Driving { route_idx, .. } => route_idx,
            _ => 0,
        };
        let committed = &mut self.routes[vehicle.index()];
        committed.truncate(keep);
        committed.extend(route.edges);
    }
}
