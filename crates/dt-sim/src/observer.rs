//! Simulation observer trait for progress reporting and data collection.

use dt_core::{Tick, VehicleId};
use dt_reroute::StepReport;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// step loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: reroute counter
///
/// ```rust,ignore
/// struct Replacements(usize);
///
/// impl SimObserver for Replacements {
///     fn on_step_end(&mut self, _tick: Tick, report: &StepReport) {
///         self.0 += report.replaced;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each step, before any processing.
    fn on_step_start(&mut self, _tick: Tick) {}

    /// Called once per vehicle that left the network this step.
    fn on_arrival(&mut self, _tick: Tick, _vehicle: VehicleId) {}

    /// Called at the end of each step with what the rerouting subsystem did.
    fn on_step_end(&mut self, _tick: Tick, _report: &StepReport) {}

    /// Called once after the final step completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
