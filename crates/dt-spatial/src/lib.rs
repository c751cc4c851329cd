//! `dt-spatial`: road network, edge costs, live speeds, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (CSR), `RoadNetworkBuilder`                   |
//! | [`cost`]    | `EdgeCost` trait, `FreeFlowCost`                            |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter`                   |
//! | [`traffic`] | `EdgeSpeeds`: live per-edge mean-speed measurements        |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod cost;
pub mod error;
pub mod network;
pub mod router;
pub mod traffic;

#[cfg(test)]
mod tests;

pub use cost::{EdgeCost, FreeFlowCost};
pub use error::{SpatialError, SpatialResult};
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router};
pub use traffic::EdgeSpeeds;
