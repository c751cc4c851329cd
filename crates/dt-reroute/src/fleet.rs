//! What the rerouting subsystem needs from the vehicle model.

use dt_core::{EdgeId, VehicleId};
use dt_spatial::Route;

/// Read access to vehicles plus the single write the registry performs:
/// replacing a vehicle's remaining route.
///
/// All methods run on the scheduling thread, never inside a routing worker.
pub trait Fleet {
    /// `true` if `vehicle` is defined and has not left the simulation.
    fn contains(&self, vehicle: VehicleId) -> bool;

    /// `true` once `vehicle` is on the network.
    fn is_inserted(&self, vehicle: VehicleId) -> bool;

    /// Edge a search for `vehicle` starts from: the current edge once
    /// inserted, the entry edge before.
    fn origin_edge(&self, vehicle: VehicleId) -> Option<EdgeId>;

    fn destination(&self, vehicle: VehicleId) -> Option<EdgeId>;

    /// The committed route from [`origin_edge`](Self::origin_edge) onwards.
    /// Empty if the vehicle has no route yet.
    fn remaining_route(&self, vehicle: VehicleId) -> &[EdgeId];

    /// Replace the remaining route.  `route` starts at the origin edge.
    fn replace_route(&mut self, vehicle: VehicleId, route: Route);
}
