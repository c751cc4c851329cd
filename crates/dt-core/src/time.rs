//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter, one tick
//! per simulation step.  The mapping to simulated seconds is held in
//! `SimClock`:
//!
//!   sim_secs = tick * tick_duration_secs
//!
//! Using an integer tick as the canonical time unit means all timer
//! arithmetic is exact (no floating-point drift) and comparisons are O(1).
//! Configuration is expressed in seconds and converted to ticks once, at
//! load time, with ceiling division so a period never fires early.
//!
//! The default tick duration for microscopic runs is 1 s.

use std::fmt;

use crate::{DtError, DtResult};

/// Longest duration accepted from configuration or parameters, in ticks.
///
/// Keeps `now + duration` far from `u64::MAX` for any reachable `now`.
pub const MAX_DURATION_TICKS: u64 = 1 << 40;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
///
/// Stored as `u64` to avoid overflow: at 1 tick/second a u64 lasts ~585
/// billion years.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn saturating_since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulated seconds.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated seconds one tick represents.  Default: 1.
    pub tick_duration_secs: f64,
    /// The current tick: advanced by `SimClock::advance()` each step.
    pub current_tick: Tick,
}

impl SimClock {
    /// Create a clock starting at tick 0 with the given resolution.
    pub fn new(tick_duration_secs: f64) -> Self {
        Self {
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Jump to `tick`.  Used when resuming from a checkpoint.
    #[inline]
    pub fn reset_to(&mut self, tick: Tick) {
        self.current_tick = tick;
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.secs_for_ticks(self.current_tick.0)
    }

    /// Break elapsed time into (hour, minute, second) components.
    /// Useful for human-readable logging without a datetime library.
    pub fn elapsed_hms(&self) -> (u64, u32, u32) {
        let total = self.elapsed_secs().max(0.0) as u64;
        let hours = total / 3_600;
        let minutes = ((total % 3_600) / 60) as u32;
        let seconds = (total % 60) as u32;
        (hours, minutes, seconds)
    }

    // ── Tick-count helpers ────────────────────────────────────────────────

    /// How many ticks span `secs` seconds?  Rounds up so that a timer
    /// configured in seconds never fires before its period has elapsed.
    ///
    /// The caller is responsible for rejecting negative or non-finite input.
    #[inline]
    pub fn ticks_for_secs(&self, secs: f64) -> u64 {
        let ticks = secs / self.tick_duration_secs;
        // Absorb float noise such as 30.000000000004 before rounding up.
        let rounded = ticks.round();
        if (ticks - rounded).abs() < 1e-9 {
            rounded as u64
        } else {
            ticks.ceil() as u64
        }
    }

    /// Convert a configured duration to ticks.
    ///
    /// `None` for negative or non-finite input and for anything longer than
    /// [`MAX_DURATION_TICKS`].  A positive duration is at least one tick.
    pub fn duration_ticks(&self, secs: f64) -> Option<u64> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        if secs / self.tick_duration_secs > MAX_DURATION_TICKS as f64 {
            return None;
        }
        let ticks = self.ticks_for_secs(secs);
        Some(if secs > 0.0 { ticks.max(1) } else { ticks })
    }

    /// Simulated seconds covered by `ticks`.
    #[inline]
    pub fn secs_for_ticks(&self, ticks: u64) -> f64 {
        ticks as f64 * self.tick_duration_secs
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.elapsed_hms();
        write!(f, "{} ({:02}:{:02}:{:02})", self.current_tick, h, m, s)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate and passed
/// to the simulation runner.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Seconds per tick.  Default: 1.
    pub tick_duration_secs: f64,

    /// Total ticks to simulate.  One hour at 1 s/tick: 3600.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration_secs)
    }

    /// Reject a tick duration that is not a positive, finite number of seconds.
    pub fn validate(&self) -> DtResult<()> {
        if !(self.tick_duration_secs.is_finite() && self.tick_duration_secs > 0.0) {
            return Err(DtError::Config(format!(
                "tick_duration_secs must be positive, got {}",
                self.tick_duration_secs
            )));
        }
        Ok(())
    }
}
