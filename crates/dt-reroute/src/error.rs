//! Error types for dt-reroute.
//!
//! Only configuration and checkpoint problems surface as errors.  A search
//! that finds no path is an ordinary outcome, not an error.

use dt_core::VehicleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerouteError {
    #[error("invalid rerouting option `{option}`: {reason}")]
    InvalidConfig {
        option: &'static str,
        reason: String,
    },

    #[error("unknown parameter `{key}` for device `rerouting`")]
    UnknownParameter { key: String },

    #[error("invalid value {value:?} for parameter `{key}`")]
    InvalidParameterValue { key: String, value: String },

    #[error("vehicle {0} has no rerouting device")]
    UnknownVehicle(VehicleId),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker pool error: {0}")]
    Pool(String),
}

pub type RerouteResult<T> = Result<T, RerouteError>;
