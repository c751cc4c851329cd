//! `dt-core`: foundational types for the `dt` traffic framework.
//!
//! This crate is a dependency of every other `dt-*` crate.  It intentionally
//! has no `dt-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `NodeId`, `EdgeId`                       |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`, `MAX_DURATION_TICKS` |
//! | [`rng`]         | `VehicleRng` (per-vehicle)                            |
//! | [`error`]       | `DtError`, `DtResult` (`SimConfig::validate`)         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `dt-reroute` checkpoints.                      |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DtError, DtResult};
pub use ids::{EdgeId, NodeId, VehicleId};
pub use rng::VehicleRng;
pub use time::{SimClock, SimConfig, Tick, MAX_DURATION_TICKS};
