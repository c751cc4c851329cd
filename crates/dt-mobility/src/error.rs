use dt_core::{EdgeId, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("vehicle {0} is not defined")]
    VehicleNotFound(VehicleId),

    #[error("vehicle {0} is already on the network")]
    AlreadyInserted(VehicleId),

    #[error("route for vehicle {vehicle} is invalid: {reason}")]
    InvalidRoute { vehicle: VehicleId, reason: String },

    #[error("edge {0} is not part of the network")]
    UnknownEdge(EdgeId),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
