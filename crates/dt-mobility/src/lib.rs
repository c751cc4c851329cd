//! `dt-mobility`: vehicle definitions, movement, and live speed measurement.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                       |
//! |------------|----------------------------------------------------------------|
//! | [`state`]  | `MovementState`: pending / driving / arrived                  |
//! | [`store`]  | `VehicleStore`: definitions, routes, occupancy; a `Fleet`     |
//! | [`engine`] | `MobilityEngine`: insertion, edge-by-edge advancement         |
//! | [`error`]  | `MobilityError`, `MobilityResult<T>`                           |
//!
//! The rerouting subsystem sees vehicles only through the
//! [`Fleet`](dt_reroute::Fleet) impl on [`VehicleStore`], and reads the
//! speed samples [`MobilityEngine::advance`] records.

pub mod engine;
pub mod error;
pub mod state;
pub mod store;


pub use engine::{CongestionModel, Insertion, MobilityEngine};
pub use error::{MobilityError, MobilityResult};
pub use state::MovementState;
pub use store::{VehicleDef, VehicleStore};
