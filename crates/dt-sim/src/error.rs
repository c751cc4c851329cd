use dt_core::{DtError, EdgeId};
use dt_mobility::MobilityError;
use dt_reroute::RerouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("vehicle #{index} has no route from {from} to {to}")]
    NoInitialRoute {
        index: usize,
        from:  EdgeId,
        to:    EdgeId,
    },

    #[error(transparent)]
    Core(#[from] DtError),

    #[error("mobility error: {0}")]
    Mobility(#[from] MobilityError),

    #[error("rerouting error: {0}")]
    Reroute(#[from] RerouteError),
}

pub type SimResult<T> = Result<T, SimError>;
