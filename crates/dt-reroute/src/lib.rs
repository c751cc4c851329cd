//! `dt-reroute`: periodic re-routing of vehicles against live edge costs.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`config`]   | `RerouteConfig` (seconds, JSON) → `ReroutingParams` (ticks)|
//! | [`cost`]     | `CostCache`, `CostView`: shared, snapshot-able weights    |
//! | [`pool`]     | `WorkerPool`: parallel searches with a per-step barrier   |
//! | [`device`]   | `RerouteDevice`: per-vehicle timer state machine          |
//! | [`fleet`]    | `Fleet`: what the registry needs from the vehicle model   |
//! | [`memo`]     | `RouteMemo`: pre-insertion route reuse                    |
//! | [`registry`] | `DeviceRegistry`: owns everything, runs once per step     |
//! | [`state_io`] | Checkpoint records and CSV persistence                     |
//! | [`error`]    | `RerouteError`, `RerouteResult<T>`                         |
//!
//! # Threading
//!
//! Only [`WorkerPool::submit_batch`] runs on more than one thread, and it
//! joins before returning.  Everything else, including every write to a
//! device or a vehicle, happens on the caller's thread.

pub mod config;
pub mod cost;
pub mod device;
pub mod error;
pub mod fleet;
pub mod memo;
pub mod pool;
pub mod registry;
pub mod state_io;


pub use config::{RerouteConfig, ReroutingParams};
pub use cost::{CostCache, CostView};
pub use device::{DevicePhase, NextFiring, Rearm, RerouteDevice, TickAction};
pub use error::{RerouteError, RerouteResult};
pub use fleet::Fleet;
pub use memo::RouteMemo;
pub use pool::{SearchRequest, SearchResult, WorkerPool};
pub use registry::{DeviceRegistry, RestoreReport, RouteOutcome, StepReport};
pub use state_io::DeviceRecord;
