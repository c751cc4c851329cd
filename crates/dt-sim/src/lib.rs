//! `dt-sim`: step loop orchestrator for the dt traffic framework.
//!
//! # Step loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Reroute : DeviceRegistry::step: refresh costs if due, run the searches
//!                whose timers fired (worker pool barrier), commit cheaper
//!                routes; clear speed samples after a refresh.
//!   ② Insert  : due vehicles try their entry edge:
//!                  Inserted → notify_insertion (insertion search)
//!                  Blocked  → skip_routing(now + insertion_retry)
//!   ③ Move    : MobilityEngine::advance, recording edge speeds.
//!   ④ Arrive  : remove_vehicle for every vehicle that left the network.
//! ```
//!
//! Everything except the batch inside ① runs on the caller's thread, in
//! ascending `VehicleId` order, so a run is reproducible for any worker
//! count.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use dt_core::SimConfig;
//! use dt_sim::{NoopObserver, SimBuilder};
//! use dt_spatial::DijkstraRouter;
//!
//! let mut sim = SimBuilder::new(config, network, DijkstraRouter::new())
//!     .reroute(reroute_config)
//!     .vehicles(defs)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! sim.save_checkpoint(Path::new("reroute.csv"))?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
