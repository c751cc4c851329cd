//! corridor: dynamic rerouting demo for the dt traffic framework.
//!
//! A stream of vehicles leaves one origin for one sink.  Two corridors
//! connect them; the faster one jams.  Vehicles with a rerouting device
//! search again periodically against measured edge speeds and move to the
//! side road when it becomes strictly cheaper.
//!
//! ```text
//! cargo run -p corridor                     # embedded config
//! cargo run -p corridor -- reroute.json     # custom RerouteConfig
//! RUST_LOG=dt_reroute=debug cargo run -p corridor
//! ```

mod network;

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dt_core::{SimConfig, Tick, VehicleId};
use dt_mobility::VehicleDef;
use dt_reroute::{RerouteConfig, StepReport};
use dt_sim::{SimBuilder, SimObserver};
use dt_spatial::DijkstraRouter;

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const VEHICLE_COUNT:      usize = 240;
const DEPART_EVERY_TICKS: u64   = 2;
const SEED:               u64   = 42;
const TICK_DURATION_SECS: f64   = 1.0;
const SIM_TICKS:          u64   = 3_600;
const CHECKPOINT_TICK:    u64   = 600;
const OUTPUT_DIR:         &str  = "output/corridor";

const DEFAULT_CONFIG: &str = r#"{
    "period_secs": 30,
    "pre_insertion_period_secs": 10,
    "refresh_interval_secs": 5,
    "worker_count": 4,
    "probability": 0.5,
    "adaptation_weight": 0.5,
    "memoize_pre_insertion": true,
    "seed": 42
}"#;

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Totals {
    searched:  usize,
    memo_hits: usize,
    skipped:   usize,
    replaced:  usize,
    no_route:  usize,
    refreshes: usize,
    arrivals:  BTreeMap<VehicleId, Tick>,
}

impl SimObserver for Totals {
    fn on_arrival(&mut self, tick: Tick, vehicle: VehicleId) {
        self.arrivals.insert(vehicle, tick);
    }

    fn on_step_end(&mut self, _tick: Tick, r: &StepReport) {
        self.searched += r.searched;
        self.memo_hits += r.memo_hits;
        self.skipped += r.skipped;
        self.replaced += r.replaced;
        self.no_route += r.no_route;
        self.refreshes += usize::from(r.refreshed);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Rerouting config.
    let reroute = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening {path}"))?;
            RerouteConfig::from_reader(file).with_context(|| format!("parsing {path}"))?
        }
        None => RerouteConfig::from_json_str(DEFAULT_CONFIG)?,
    };
    info!(config = %serde_json::to_string(&reroute)?, "rerouting config");

    // 2. Network and demand.
    let corridors = build_network()?;
    let (entry_edge, destination) = (corridors.entry, corridors.exit);
    let vehicles = (0..VEHICLE_COUNT as u64).map(move |i| VehicleDef {
        depart: Tick(i * DEPART_EVERY_TICKS),
        entry_edge,
        destination,
    });

    // 3. Build sim.
    let config = SimConfig {
        tick_duration_secs: TICK_DURATION_SECS,
        total_ticks:        SIM_TICKS,
        seed:               SEED,
    };
    let mut sim = SimBuilder::new(config, corridors.network, DijkstraRouter::new())
        .reroute(reroute)
        .vehicles(vehicles)
        .build()?;
    println!(
        "Network: {} nodes, {} edges  |  Vehicles: {}  |  Devices: {}",
        sim.network.node_count(),
        sim.network.edge_count(),
        sim.mobility.store.len(),
        sim.registry.len()
    );

    // 4. Run, writing a checkpoint part-way.
    let mut totals = Totals::default();
    let t0 = Instant::now();
    sim.run_ticks(CHECKPOINT_TICK, &mut totals)?;
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let checkpoint = Path::new(OUTPUT_DIR).join("reroute_state.csv");
    sim.save_checkpoint(&checkpoint)?;
    sim.run(&mut totals)?;
    let elapsed = t0.elapsed();

    // 5. Summary.
    let store = &sim.mobility.store;
    let using = |edge| {
        (0..store.len())
            .map(|i| VehicleId(i as u32))
            .filter(|&v| store.route(v).contains(&edge))
            .count()
    };
    let (arterial, side_road) = (using(corridors.fast[0]), using(corridors.slow[0]));
    let travel: Vec<u64> = totals
        .arrivals
        .iter()
        .filter_map(|(&v, &at)| store.def(v).map(|d| at.saturating_since(d.depart)))
        .collect();
    let mean_travel = travel.iter().sum::<u64>() as f64 / travel.len().max(1) as f64;

    println!("Simulation complete in {:.3} s ({})", elapsed.as_secs_f64(), sim.clock);
    println!("  arrived            : {} / {}", totals.arrivals.len(), store.len());
    println!("  mean travel time   : {mean_travel:.1} ticks");
    println!("  via arterial       : {arterial}");
    println!("  via side road      : {side_road}");
    println!("  cost refreshes     : {}", totals.refreshes);
    println!("  searches           : {} (+{} memo hits)", totals.searched, totals.memo_hits);
    println!("  routes replaced    : {}", totals.replaced);
    println!("  skipped firings    : {}", totals.skipped);
    println!("  searches w/o route : {}", totals.no_route);
    println!("  checkpoint         : {} (tick {CHECKPOINT_TICK})", checkpoint.display());

    Ok(())
}
