//! Fluent builder for constructing a [`Sim`].

use dt_core::{SimConfig, Tick, VehicleId, MAX_DURATION_TICKS};
use dt_mobility::{CongestionModel, MobilityEngine, VehicleDef};
use dt_reroute::{DeviceRegistry, RerouteConfig};
use dt_spatial::{DijkstraRouter, EdgeSpeeds, FreeFlowCost, RoadNetwork, Router};
use tracing::{info, warn};

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: total ticks, seed, tick duration
/// - [`RoadNetwork`]
/// - `R: Router + Clone`: the routing algorithm used for rerouting searches
///   (e.g. [`dt_spatial::DijkstraRouter`]); the pool clones it per worker
///
/// # Optional inputs (have defaults)
///
/// | Method                       | Default                      |
/// |------------------------------|------------------------------|
/// | `.reroute(c)`                | `RerouteConfig::default()`   |
/// | `.vehicle(d)` / `.vehicles`  | no vehicles                  |
/// | `.congestion(m)`             | `CongestionModel::default()` |
/// | `.insertion_retry_secs(s)`   | 1 s                          |
///
/// Initial routes are free-flow shortest paths from each vehicle's entry
/// edge to its destination.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, network, DijkstraRouter::new())
///     .reroute(RerouteConfig::from_json_str(&json)?)
///     .vehicles(defs)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<R: Router + Clone> {
    config:          SimConfig,
    network:         RoadNetwork,
    router:          R,
    reroute:         RerouteConfig,
    vehicles:        Vec<VehicleDef>,
    congestion:      CongestionModel,
    insertion_retry: f64,
}

impl<R: Router + Clone> SimBuilder<R> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, network: RoadNetwork, router: R) -> Self {
        Self {
            config,
            network,
            router,
            reroute:         RerouteConfig::default(),
            vehicles:        Vec::new(),
            congestion:      CongestionModel::default(),
            insertion_retry: 1.0,
        }
    }

    pub fn reroute(mut self, config: RerouteConfig) -> Self {
        self.reroute = config;
        self
    }

    /// Add one vehicle.  Vehicles get ids in the order they are added.
    pub fn vehicle(mut self, def: VehicleDef) -> Self {
        self.vehicles.push(def);
        self
    }

    pub fn vehicles(mut self, defs: impl IntoIterator<Item = VehicleDef>) -> Self {
        self.vehicles.extend(defs);
        self
    }

    pub fn congestion(mut self, model: CongestionModel) -> Self {
        self.congestion = model;
        self
    }

    /// How long a vehicle that found its entry edge full goes without
    /// pre-insertion searches.
    pub fn insertion_retry_secs(mut self, secs: f64) -> Self {
        self.insertion_retry = secs;
        self
    }

    /// Validate inputs, compute initial routes, attach devices, and return a
    /// ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<R>> {
        // ── Validate ──────────────────────────────────────────────────────
        self.config.validate()?;
        let clock = self.config.make_clock();
        let insertion_retry = match clock.duration_ticks(self.insertion_retry) {
            Some(ticks) if ticks > 0 => ticks,
            _ => {
                return Err(SimError::Config(format!(
                    "insertion retry must be a positive duration of at most {MAX_DURATION_TICKS} ticks, got {} s",
                    self.insertion_retry
                )));
            }
        };
        let params = self.reroute.validate(&clock)?;

        for &v in &params.explicit_vehicles {
            if v.index() >= self.vehicles.len() {
                warn!(vehicle = %v, "explicitly listed vehicle is not defined");
            }
        }

        // ── Vehicles and initial routes ───────────────────────────────────
        let network = self.network;
        let mut mobility = MobilityEngine::with_model(network.edge_count(), self.congestion);
        let mut registry = DeviceRegistry::new(params, &clock, self.router);
        let mut initial = DijkstraRouter::new();

        for (index, def) in self.vehicles.into_iter().enumerate() {
            let route = initial
                .route(&network, def.entry_edge, def.destination, &FreeFlowCost)
                .ok_or(SimError::NoInitialRoute { index, from: def.entry_edge, to: def.destination })?;
            let vehicle: VehicleId = mobility.store.define(def, route.edges, &network)?;
            registry.maybe_build_device(vehicle, &network, Tick::ZERO);
        }

        info!(
            vehicles = mobility.store.len(),
            devices = registry.len(),
            edges = network.edge_count(),
            "simulation built"
        );

        Ok(Sim {
            speeds: EdgeSpeeds::new(network.edge_count()),
            clock,
            config: self.config,
            network,
            mobility,
            registry,
            insertion_retry,
        })
    }
}
