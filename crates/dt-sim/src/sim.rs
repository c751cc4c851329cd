//! The `Sim` struct and its step loop.

use std::path::Path;

use dt_core::{SimClock, SimConfig, Tick, VehicleId};
use dt_mobility::{Insertion, MobilityEngine};
use dt_reroute::{state_io, DeviceRegistry, RestoreReport, StepReport};
use dt_spatial::{EdgeSpeeds, RoadNetwork, Router};
use tracing::{debug, info};

use crate::{SimObserver, SimResult};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<R>` holds all simulation state and drives the four-phase step loop:
///
/// 1. **Reroute**: [`DeviceRegistry::step`] refreshes the cost table when
///    due, runs every search whose timer fired, and commits strictly cheaper
///    routes.  Speed samples are cleared after a refresh consumed them.
/// 2. **Insert**: vehicles whose departure has come try to enter their first
///    edge.  A blocked vehicle has its searches suppressed for
///    `insertion_retry` ticks; an inserted one gets its insertion search.
/// 3. **Move**: [`MobilityEngine::advance`] moves vehicles and records speed
///    samples for the next refresh.
/// 4. **Arrivals**: devices of vehicles that left the network are removed.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<R: Router + Clone> {
    /// Global configuration (total ticks, seed, tick duration).
    pub config: SimConfig,

    /// Simulation clock: tracks the current tick and maps to wall time.
    pub clock: SimClock,

    pub network: RoadNetwork,

    /// Vehicles, their committed routes, and movement.
    pub mobility: MobilityEngine,

    /// Rerouting devices, the cost cache, and the worker pool.
    pub registry: DeviceRegistry<R>,

    /// Speed samples since the last cost refresh.
    pub speeds: EdgeSpeeds,

    /// Ticks a vehicle that could not be inserted waits before its next
    /// pre-insertion search.
    pub insertion_retry: u64,
}

impl<R: Router + Clone> Sim<R> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        info!(
            clock = %self.clock,
            arrived = self.mobility.store.arrived_count(),
            driving = self.mobility.store.driving_count(),
            "simulation finished"
        );
        Ok(())
    }

    /// Run exactly `n` steps from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// `true` once every defined vehicle has arrived.
    pub fn is_finished(&self) -> bool {
        self.mobility.store.arrived_count() == self.mobility.store.len()
    }

    // ── Checkpoints ───────────────────────────────────────────────────────

    /// Write the rerouting state of every live device as CSV.
    pub fn save_checkpoint(&self, path: &Path) -> SimResult<()> {
        let records = self.registry.save_state();
        state_io::save_to_path(path, &records)?;
        info!(path = %path.display(), devices = records.len(), tick = %self.clock.current_tick, "checkpoint written");
        Ok(())
    }

    /// Rebuild devices from a checkpoint at the current tick.
    ///
    /// Vehicles must already be defined; the checkpoint carries only the
    /// rerouting state.  Use `clock.reset_to` first when resuming a run.
    pub fn restore_checkpoint(&mut self, path: &Path) -> SimResult<RestoreReport> {
        let records = state_io::load_from_path(path)?;
        Ok(self.registry.load_state(&records, &self.network, &self.mobility.store, self.clock.current_tick))
    }

    // ── Parameters ────────────────────────────────────────────────────────

    pub fn get_parameter(&self, vehicle: VehicleId, key: &str) -> SimResult<String> {
        Ok(self.registry.get_parameter(vehicle, key)?)
    }

    pub fn set_parameter(&mut self, vehicle: VehicleId, key: &str, value: &str) -> SimResult<()> {
        let now = self.clock.current_tick;
        Ok(self.registry.set_parameter(vehicle, key, value, now)?)
    }

    // ── Core step processing ──────────────────────────────────────────────

    fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_step_start(now);
        let report = self.process_step(now, observer)?;
        observer.on_step_end(now, &report);
        self.clock.advance();
        Ok(())
    }

    fn process_step<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<StepReport> {
        // ── Phase 1: rerouting ────────────────────────────────────────────
        let report = self.registry.step(now, &self.network, &self.speeds, &mut self.mobility.store)?;
        if report.refreshed {
            self.speeds.clear();
        }

        // ── Phase 2: insertions ───────────────────────────────────────────
        //
        // Ascending VehicleId order; a vehicle blocked now is offered the
        // entry edge again on every following step.
        for vehicle in self.mobility.store.due_for_insertion(now) {
            match self.mobility.try_insert(vehicle, &self.network, &self.clock, now)? {
                Insertion::Inserted => {
                    self.registry.notify_insertion(vehicle, &self.network, &mut self.mobility.store, now);
                }
                Insertion::Blocked => {
                    self.registry.skip_routing(vehicle, now + self.insertion_retry);
                }
            }
        }

        // ── Phase 3: movement ─────────────────────────────────────────────
        let arrived = self.mobility.advance(&self.network, &self.clock, now, &mut self.speeds);

        // ── Phase 4: arrivals ─────────────────────────────────────────────
        for &vehicle in &arrived {
            self.registry.remove_vehicle(vehicle);
            observer.on_arrival(now, vehicle);
        }
        if !arrived.is_empty() {
            debug!(%now, arrived = arrived.len(), "vehicles arrived");
        }

        Ok(report)
    }
}
