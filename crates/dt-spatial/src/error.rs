//! Spatial-subsystem error type.

use thiserror::Error;

use dt_core::{EdgeId, NodeId};

/// Errors produced by `dt-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("edge {0} not found in network")]
    EdgeNotFound(EdgeId),

    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from:   NodeId,
        to:     NodeId,
        reason: &'static str,
    },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
