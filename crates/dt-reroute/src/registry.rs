//! `DeviceRegistry`: owns every device, the cost cache, and the worker pool,
//! and drives them once per simulation step.
//!
//! # Step order
//!
//! ```text
//! step(now):
//!   1. refresh the cost cache if due        (memo cleared)
//!   2. drain due timers, ask each device    (skip → reschedule, else request)
//!   3. submit_batch against one snapshot    (blocks until all done)
//!   4. apply results, re-arm timers         (scheduling thread only)
//! ```
//!
//! Refresh strictly precedes batch collection, so a batch never straddles a
//! table swap.  All device and vehicle mutation happens in phase 4, after
//! the pool has joined.
//!
//! # Lazy resources
//!
//! The cost cache is initialized when the first device is built.  The
//! worker pool is created on the first batch.

use std::collections::BTreeMap;

use dt_core::{EdgeId, SimClock, Tick, VehicleId, VehicleRng};
use dt_schedule::TimerQueue;
use dt_spatial::{EdgeSpeeds, RoadNetwork, Route, Router};
use tracing::{debug, info, warn};

use crate::config::ReroutingParams;
use crate::cost::{CostCache, CostView};
use crate::device::{NextFiring, Rearm, RerouteDevice, TickAction};
use crate::fleet::Fleet;
use crate::memo::RouteMemo;
use crate::pool::{SearchRequest, WorkerPool};
use crate::state_io::{self, DeviceRecord};
use crate::{RerouteError, RerouteResult};

/// Parameter key prefix for reading a cached edge weight: `edge:<id>`.
pub const EDGE_WEIGHT_PREFIX: &str = "edge:";

// ── Reports ───────────────────────────────────────────────────────────────────

/// What one [`DeviceRegistry::step`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The cost table was refreshed this step.
    pub refreshed: bool,
    /// Timers that fired.
    pub due:       usize,
    /// Searches run by the worker pool.
    pub searched:  usize,
    /// Pre-insertion searches answered from the memo.
    pub memo_hits: usize,
    /// Firings suppressed by a skip window.
    pub skipped:   usize,
    /// Routes replaced by a strictly cheaper one.
    pub replaced:  usize,
    /// Searches that found no path.
    pub no_route:  usize,
}

/// How one search result was applied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Replaced,
    /// A path was found but it was not strictly cheaper.
    Kept,
    NoRoute,
}

/// Result of [`DeviceRegistry::load_state`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Records naming vehicles the fleet does not know.
    pub skipped:  Vec<VehicleId>,
}

// ── DeviceRegistry ────────────────────────────────────────────────────────────

pub struct DeviceRegistry<R: Router + Clone> {
    params:       ReroutingParams,
    clock:        SimClock,
    /// Prototype for the pool, and the router used for insertion searches.
    router:       R,
    cost:         Option<CostCache>,
    pool:         Option<WorkerPool<R>>,
    devices:      BTreeMap<VehicleId, RerouteDevice>,
    timers:       TimerQueue<VehicleId>,
    next_refresh: Option<Tick>,
    memo:         RouteMemo,
    no_route:     NoRouteNotice,
}

impl<R: Router + Clone> DeviceRegistry<R> {
    pub fn new(params: ReroutingParams, clock: &SimClock, router: R) -> Self {
        Self {
            params,
            clock: clock.clone(),
            router,
            cost: None,
            pool: None,
            devices: BTreeMap::new(),
            timers: TimerQueue::new(),
            next_refresh: None,
            memo: RouteMemo::new(),
            no_route: NoRouteNotice::default(),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn params(&self) -> &ReroutingParams {
        &self.params
    }

    pub fn device(&self, vehicle: VehicleId) -> Option<&RerouteDevice> {
        self.devices.get(&vehicle)
    }

    pub fn devices(&self) -> impl Iterator<Item = &RerouteDevice> + '_ {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn cost_cache(&self) -> Option<&CostCache> {
        self.cost.as_ref()
    }

    /// Worker count of the pool, once it exists.
    pub fn pool_workers(&self) -> Option<usize> {
        self.pool.as_ref().map(|p| p.worker_count())
    }

    pub fn next_refresh(&self) -> Option<Tick> {
        self.next_refresh
    }

    /// Tick at which `vehicle`'s device fires next, if armed.
    pub fn next_firing(&self, vehicle: VehicleId) -> Option<Tick> {
        let handle = self.devices.get(&vehicle)?.pending()?;
        self.timers.fire_tick(handle)
    }

    /// Number of queued timers carrying `vehicle`.  Never more than one.
    pub fn pending_timers(&self, vehicle: VehicleId) -> usize {
        self.timers.iter().filter(|&(_, _, &v)| v == vehicle).count()
    }

    pub fn memo(&self) -> &RouteMemo {
        &self.memo
    }

    // ── Device lifecycle ──────────────────────────────────────────────────

    /// `true` if `vehicle` is selected for a device: listed explicitly, or
    /// drawn with the configured probability.  The draw depends only on the
    /// seed and the vehicle id.
    pub fn wants_device(&self, vehicle: VehicleId) -> bool {
        if self.params.explicit_vehicles.contains(&vehicle) {
            return true;
        }
        self.params.probability > 0.0
            && VehicleRng::new(self.params.seed, vehicle).gen_bool(self.params.probability)
    }

    /// Build a device for a newly defined vehicle if it is selected.
    /// Returns `true` if a device was built.
    pub fn maybe_build_device(&mut self, vehicle: VehicleId, network: &RoadNetwork, now: Tick) -> bool {
        if self.devices.contains_key(&vehicle) || !self.wants_device(vehicle) {
            return false;
        }
        self.build_device(vehicle, network, now);
        true
    }

    /// Build a device for `vehicle` with the configured periods, replacing
    /// any existing one.
    pub fn build_device(&mut self, vehicle: VehicleId, network: &RoadNetwork, now: Tick) {
        let mut device = RerouteDevice::new(vehicle, self.params.period, self.params.pre_insertion_period);
        let firing = device.attach(now);
        self.install(device, firing, network, now);
    }

    fn install(&mut self, mut device: RerouteDevice, firing: NextFiring, network: &RoadNetwork, now: Tick) {
        self.ensure_cost(network, now);
        let vehicle = device.vehicle();
        if let Some(mut old) = self.devices.remove(&vehicle) {
            if let Some(handle) = old.detach() {
                self.timers.cancel(handle);
            }
        }
        arm(&mut self.timers, &mut device, firing, now);
        self.devices.insert(vehicle, device);
    }

    fn ensure_cost(&mut self, network: &RoadNetwork, now: Tick) -> &CostCache {
        if self.next_refresh.is_none() {
            self.next_refresh = Some(now + self.params.refresh_interval);
        }
        let (weight, min_speed) = (self.params.adaptation_weight, self.params.min_speed_mps);
        let cost = self.cost.get_or_insert_with(|| CostCache::new(weight, min_speed));
        cost.initialize(network, now);
        cost
    }

    /// The vehicle left the simulation.  Its timer is cancelled and any
    /// result still owed to it will be discarded.
    pub fn remove_vehicle(&mut self, vehicle: VehicleId) -> bool {
        let Some(mut device) = self.devices.remove(&vehicle) else {
            return false;
        };
        if let Some(handle) = device.detach() {
            self.timers.cancel(handle);
        }
        true
    }

    /// Suppress searches for `vehicle` before `until`.
    pub fn skip_routing(&mut self, vehicle: VehicleId, until: Tick) -> bool {
        match self.devices.get_mut(&vehicle) {
            Some(device) => {
                device.skip_routing(until);
                true
            }
            None => false,
        }
    }

    /// The vehicle was inserted at `now`.  Runs the insertion search on the
    /// calling thread and starts the periodic loop.
    ///
    /// Returns `None` if the vehicle has no device or was already inserted.
    pub fn notify_insertion<F: Fleet>(
        &mut self,
        vehicle: VehicleId,
        network: &RoadNetwork,
        fleet:   &mut F,
        now:     Tick,
    ) -> Option<RouteOutcome> {
        let device = self.devices.get_mut(&vehicle)?;
        let firing = device.insert(now)?;
        if let Some(handle) = device.disarm() {
            self.timers.cancel(handle);
        }

        let view = self.ensure_cost(network, now).snapshot();
        let result = match (fleet.origin_edge(vehicle), fleet.destination(vehicle)) {
            (Some(origin), Some(destination)) => self.router.route(network, origin, destination, &view),
            _ => None,
        };
        let outcome = apply_result(fleet, network, &view, vehicle, result);
        if outcome == RouteOutcome::NoRoute {
            self.no_route.record(vehicle, now);
        }

        if let Some(device) = self.devices.get_mut(&vehicle) {
            arm(&mut self.timers, device, firing, now);
        }
        Some(outcome)
    }

    // ── Per-step driver ───────────────────────────────────────────────────

    /// Run one simulation step of the rerouting subsystem.
    ///
    /// `speeds` holds the measurements since the last refresh; the caller
    /// clears it when the report says `refreshed`.
    pub fn step<F: Fleet>(
        &mut self,
        now:     Tick,
        network: &RoadNetwork,
        speeds:  &EdgeSpeeds,
        fleet:   &mut F,
    ) -> RerouteResult<StepReport> {
        let mut report = StepReport::default();

        // 1. Refresh.
        if let (Some(at), Some(cost)) = (self.next_refresh, self.cost.as_mut()) {
            if at <= now {
                cost.refresh(network, speeds, now);
                self.memo.clear();
                self.next_refresh = Some(now + self.params.refresh_interval);
                report.refreshed = true;
            }
        }

        // 2. Collect.
        let mut fired = self.timers.drain_due(now);
        fired.sort_by_key(|&(_, vehicle)| vehicle);
        report.due = fired.len();

        let mut requests: Vec<SearchRequest> = Vec::new();
        let mut memoized: Vec<(VehicleId, Route)> = Vec::new();

        for (handle, vehicle) in fired {
            let Some(device) = self.devices.get_mut(&vehicle) else {
                continue;
            };
            if device.pending() != Some(handle) {
                continue;
            }
            device.disarm();

            match device.poll(now) {
                TickAction::Reschedule(firing) => {
                    if firing != NextFiring::Never {
                        report.skipped += 1;
                    }
                    arm(&mut self.timers, device, firing, now);
                }
                TickAction::Search => {
                    let (Some(origin), Some(destination)) =
                        (fleet.origin_edge(vehicle), fleet.destination(vehicle))
                    else {
                        // Nothing to search for; keep the cadence.
                        let firing = device.complete(now);
                        arm(&mut self.timers, device, firing, now);
                        continue;
                    };
                    // The memo is only filled in the apply phase, so same-pair
                    // requests due in this step all go to the pool.
                    if self.params.memoize_pre_insertion && device.is_pre_insertion() {
                        if let Some(route) = self.memo.get(origin, destination) {
                            memoized.push((vehicle, route));
                            continue;
                        }
                    }
                    requests.push(SearchRequest { vehicle, origin, destination });
                }
            }
        }

        if requests.is_empty() && memoized.is_empty() {
            log_step(now, &report);
            return Ok(report);
        }
        let Some(view) = self.cost.as_ref().map(CostCache::snapshot) else {
            return Ok(report);
        };

        // 3. Search.
        let results = if requests.is_empty() {
            Vec::new()
        } else {
            if self.pool.is_none() {
                self.pool = Some(WorkerPool::new(&self.router, self.params.worker_count)?);
            }
            match self.pool.as_mut() {
                Some(pool) => pool.submit_batch(network, &view, &requests),
                None => Vec::new(),
            }
        };
        report.searched = results.len();
        report.memo_hits = memoized.len();

        // 4. Apply.
        let searched = requests.iter().map(|r| r.vehicle).zip(results);
        let answered = memoized.into_iter().map(|(v, route)| (v, Some(route)));
        for (vehicle, result) in searched.chain(answered) {
            let Some(device) = self.devices.get_mut(&vehicle) else {
                continue;
            };
            if self.params.memoize_pre_insertion && device.is_pre_insertion() {
                if let Some(route) = &result {
                    self.memo.insert(route.clone());
                }
            }
            match apply_result(fleet, network, &view, vehicle, result) {
                RouteOutcome::Replaced => report.replaced += 1,
                RouteOutcome::Kept => {}
                RouteOutcome::NoRoute => {
                    report.no_route += 1;
                    self.no_route.record(vehicle, now);
                }
            }
            let firing = device.complete(now);
            arm(&mut self.timers, device, firing, now);
        }

        log_step(now, &report);
        Ok(report)
    }

    // ── Parameters ────────────────────────────────────────────────────────

    /// Read a device parameter, or `edge:<id>` for a cached edge weight.
    pub fn get_parameter(&self, vehicle: VehicleId, key: &str) -> RerouteResult<String> {
        let device = self.devices.get(&vehicle).ok_or(RerouteError::UnknownVehicle(vehicle))?;
        if let Some(id) = key.strip_prefix(EDGE_WEIGHT_PREFIX) {
            let edge: EdgeId = id.parse().map_err(|_| RerouteError::UnknownParameter { key: key.to_string() })?;
            return self
                .cost
                .as_ref()
                .and_then(|c| c.weight(edge))
                .map(|w| w.to_string())
                .ok_or_else(|| RerouteError::UnknownParameter { key: key.to_string() });
        }
        device.parameter(key, &self.clock)
    }

    /// Change a device parameter at `now`, re-arming its timer if needed.
    pub fn set_parameter(
        &mut self,
        vehicle: VehicleId,
        key:     &str,
        value:   &str,
        now:     Tick,
    ) -> RerouteResult<()> {
        let device = self.devices.get_mut(&vehicle).ok_or(RerouteError::UnknownVehicle(vehicle))?;
        match device.set_parameter(key, value, &self.clock)? {
            Rearm::Keep => {}
            Rearm::Cancel => {
                if let Some(handle) = device.disarm() {
                    self.timers.cancel(handle);
                }
            }
            Rearm::Schedule(firing) => arm(&mut self.timers, device, firing, now),
        }
        Ok(())
    }

    // ── Checkpoints ───────────────────────────────────────────────────────

    /// Records for every live device, in `VehicleId` order.
    pub fn save_state(&self) -> Vec<DeviceRecord> {
        self.devices.values().map(state_io::save).collect()
    }

    /// Restore devices at tick `now`.  Records for vehicles the fleet does
    /// not know are skipped and reported.
    pub fn load_state<F: Fleet>(
        &mut self,
        records: &[DeviceRecord],
        network: &RoadNetwork,
        fleet:   &F,
        now:     Tick,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();
        for record in records {
            let vehicle = record.vehicle();
            if !fleet.contains(vehicle) {
                warn!(%vehicle, "checkpoint names an unknown vehicle; record skipped");
                report.skipped.push(vehicle);
                continue;
            }
            let (device, firing) = state_io::restore(record, fleet.is_inserted(vehicle), now);
            self.install(device, firing, network, now);
            report.restored += 1;
        }
        info!(%now, restored = report.restored, skipped = report.skipped.len(), "rerouting state restored");
        report
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Schedule `firing` for `device`, cancelling whatever it had pending.
/// Absolute firings in the past are moved to `now`.
fn arm(timers: &mut TimerQueue<VehicleId>, device: &mut RerouteDevice, firing: NextFiring, now: Tick) {
    if let Some(old) = device.disarm() {
        timers.cancel(old);
    }
    if let Some(at) = firing.resolve(now) {
        let handle = timers.schedule(at.max(now), device.vehicle());
        device.arm(handle);
    }
}

/// Replace the vehicle's remaining route with `result` if it is strictly
/// cheaper under `view`.  An empty current route is always replaced.
fn apply_result<F: Fleet>(
    fleet:   &mut F,
    network: &RoadNetwork,
    view:    &CostView,
    vehicle: VehicleId,
    result:  Option<Route>,
) -> RouteOutcome {
    let Some(route) = result else {
        return RouteOutcome::NoRoute;
    };
    if !fleet.contains(vehicle) {
        return RouteOutcome::Kept;
    }
    let current = fleet.remaining_route(vehicle);
    if !current.is_empty() {
        if current == route.edges.as_slice() {
            return RouteOutcome::Kept;
        }
        if route.total_cost >= Route::cost_of(network, current, view) {
            return RouteOutcome::Kept;
        }
    }
    fleet.replace_route(vehicle, route);
    RouteOutcome::Replaced
}

fn log_step(now: Tick, report: &StepReport) {
    if report.due > 0 || report.refreshed {
        debug!(
            %now,
            refreshed = report.refreshed,
            due = report.due,
            searched = report.searched,
            memo_hits = report.memo_hits,
            skipped = report.skipped,
            replaced = report.replaced,
            no_route = report.no_route,
            "reroute step",
        );
    }
}

/// Logs "no route" on the 1st, 2nd, 4th, 8th … occurrence.
#[derive(Debug, Default)]
struct NoRouteNotice {
    count: u64,
}

impl NoRouteNotice {
    fn record(&mut self, vehicle: VehicleId, now: Tick) {
        self.count += 1;
        if self.count.is_power_of_two() {
            warn!(%vehicle, %now, occurrences = self.count, "no route found; keeping current route");
        }
    }
}
