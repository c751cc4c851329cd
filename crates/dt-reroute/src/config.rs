//! Rerouting configuration.
//!
//! [`RerouteConfig`] is the user-facing form: durations in seconds, loadable
//! from JSON.  [`RerouteConfig::validate`] checks it against a [`SimClock`]
//! and produces [`ReroutingParams`], the tick-based form the registry runs on.
//! Bad values are rejected, never clamped.
//!
//! ```
//! use dt_core::SimClock;
//! use dt_reroute::RerouteConfig;
//!
//! let cfg = RerouteConfig::from_json_str(r#"{ "period_secs": 30, "worker_count": 4 }"#).unwrap();
//! let params = cfg.validate(&SimClock::new(0.5)).unwrap();
//! assert_eq!(params.period, 60);
//! ```

use std::io::Read;

use dt_core::{SimClock, VehicleId, MAX_DURATION_TICKS};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{RerouteError, RerouteResult};

// ── RerouteConfig ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RerouteConfig {
    /// Seconds between periodic searches once a vehicle is driving.
    /// 0 means "only once, at insertion".
    pub period_secs: f64,

    /// Seconds between searches while a vehicle waits to be inserted.
    /// 0 disables pre-insertion routing.
    pub pre_insertion_period_secs: f64,

    /// Seconds between cost-table refreshes.  Must be positive.
    pub refresh_interval_secs: f64,

    /// Routing threads.  0 runs searches on the calling thread.
    pub worker_count: usize,

    /// Chance that a vehicle not listed in `explicit_vehicles` gets a device.
    pub probability: f64,

    /// Vehicles that always get a device.
    pub explicit_vehicles: Vec<VehicleId>,

    /// Weight of the previous speed when smoothing measurements, in `[0, 1)`.
    pub adaptation_weight: f64,

    /// Lower bound on the speed used to derive an edge weight.
    pub min_speed_mps: f64,

    /// Reuse pre-insertion search results for identical origin/destination
    /// pairs until the next refresh.
    pub memoize_pre_insertion: bool,

    /// Seed for device assignment sampling.
    pub seed: u64,
}

impl Default for RerouteConfig {
    fn default() -> Self {
        Self {
            period_secs:               0.0,
            pre_insertion_period_secs: 1.0,
            refresh_interval_secs:     1.0,
            worker_count:              0,
            probability:               0.0,
            explicit_vehicles:         Vec::new(),
            adaptation_weight:         0.0,
            min_speed_mps:             0.1,
            memoize_pre_insertion:     false,
            seed:                      0,
        }
    }
}

impl RerouteConfig {
    pub fn from_json_str(json: &str) -> RerouteResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> RerouteResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Check every option and convert durations to ticks of `clock`.
    pub fn validate(&self, clock: &SimClock) -> RerouteResult<ReroutingParams> {
        let period = duration_ticks("period_secs", self.period_secs, clock)?;
        let pre_insertion_period =
            duration_ticks("pre_insertion_period_secs", self.pre_insertion_period_secs, clock)?;

        if !(self.refresh_interval_secs > 0.0) {
            return Err(invalid(
                "refresh_interval_secs",
                format!("must be positive, got {}", self.refresh_interval_secs),
            ));
        }
        let refresh_interval = duration_ticks("refresh_interval_secs", self.refresh_interval_secs, clock)?;

        if !(0.0..=1.0).contains(&self.probability) {
            return Err(invalid(
                "probability",
                format!("must lie in [0, 1], got {}", self.probability),
            ));
        }
        if !(0.0..1.0).contains(&self.adaptation_weight) {
            return Err(invalid(
                "adaptation_weight",
                format!("must lie in [0, 1), got {}", self.adaptation_weight),
            ));
        }
        if !(self.min_speed_mps.is_finite() && self.min_speed_mps > 0.0) {
            return Err(invalid(
                "min_speed_mps",
                format!("must be positive, got {}", self.min_speed_mps),
            ));
        }

        Ok(ReroutingParams {
            period,
            pre_insertion_period,
            refresh_interval,
            worker_count: self.worker_count,
            probability: self.probability,
            explicit_vehicles: self.explicit_vehicles.iter().copied().collect(),
            adaptation_weight: self.adaptation_weight,
            min_speed_mps: self.min_speed_mps,
            memoize_pre_insertion: self.memoize_pre_insertion,
            seed: self.seed,
        })
    }
}

fn duration_ticks(option: &'static str, secs: f64, clock: &SimClock) -> RerouteResult<u64> {
    clock.duration_ticks(secs).ok_or_else(|| {
        invalid(
            option,
            format!("must be a non-negative duration of at most {MAX_DURATION_TICKS} ticks, got {secs}"),
        )
    })
}

fn invalid(option: &'static str, reason: String) -> RerouteError {
    RerouteError::InvalidConfig { option, reason }
}

// ── ReroutingParams ───────────────────────────────────────────────────────────

/// Validated configuration with every duration expressed in ticks.
#[derive(Clone, Debug)]
pub struct ReroutingParams {
    pub period:                u64,
    pub pre_insertion_period:  u64,
    /// Always at least 1.
    pub refresh_interval:      u64,
    pub worker_count:          usize,
    pub probability:           f64,
    pub explicit_vehicles:     FxHashSet<VehicleId>,
    pub adaptation_weight:     f64,
    pub min_speed_mps:         f64,
    pub memoize_pre_insertion: bool,
    pub seed:                  u64,
}

impl Default for ReroutingParams {
    fn default() -> Self {
        // The default config is valid for any positive tick duration.
        let cfg = RerouteConfig::default();
        Self {
            period:                0,
            pre_insertion_period:  1,
            refresh_interval:      1,
            worker_count:          cfg.worker_count,
            probability:           cfg.probability,
            explicit_vehicles:     FxHashSet::default(),
            adaptation_weight:     cfg.adaptation_weight,
            min_speed_mps:         cfg.min_speed_mps,
            memoize_pre_insertion: cfg.memoize_pre_insertion,
            seed:                  cfg.seed,
        }
    }
}
