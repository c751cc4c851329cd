//! Per-vehicle rerouting state machine.
//!
//! # Phases
//!
//! ```text
//!   Unattached ──attach (pre-insertion period > 0)──▶ WaitingForInsertion
//!        │                                                  │
//!        └──────────────── insertion (once) ────────────────┴──▶ Active
//!
//!   any ── detach ──▶ Detached
//! ```
//!
//! A device never touches the timer queue or the vehicle itself.  Each
//! method returns what should happen next (a [`NextFiring`] or a
//! [`TickAction`]) and the registry carries it out.  The device only stores
//! the handle of its single outstanding timer, which is what keeps "at most
//! one pending timer per device" checkable.

use std::fmt;

use dt_core::{SimClock, Tick, VehicleId};
use dt_schedule::TimerHandle;

use crate::{RerouteError, RerouteResult};

// ── Phase & outcomes ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DevicePhase {
    /// Attached to a vehicle that has not been inserted, without
    /// pre-insertion routing.
    Unattached,
    /// Pre-insertion loop: searching from the entry edge until inserted.
    WaitingForInsertion,
    /// The vehicle is on the network.  Dormant if `period == 0`.
    Active,
    /// Terminal.  No further ticks.
    Detached,
}

impl fmt::Display for DevicePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DevicePhase::Unattached          => "unattached",
            DevicePhase::WaitingForInsertion => "waiting-for-insertion",
            DevicePhase::Active              => "active",
            DevicePhase::Detached            => "detached",
        };
        f.write_str(s)
    }
}

/// When a device wants its timer to fire next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NextFiring {
    /// At an absolute tick.
    At(Tick),
    /// `n` ticks from now.  Never zero.
    After(u64),
    /// Do not schedule anything.
    Never,
}

impl NextFiring {
    /// Relative firing that collapses a zero offset to `Never`.
    pub fn after(ticks: u64) -> NextFiring {
        if ticks == 0 { NextFiring::Never } else { NextFiring::After(ticks) }
    }

    /// Absolute tick for a firing requested at `now`.  `None` when nothing
    /// is to be scheduled or the tick would not fit in a `u64`.
    pub fn resolve(self, now: Tick) -> Option<Tick> {
        match self {
            NextFiring::At(t)    => Some(t),
            NextFiring::After(n) => now.0.checked_add(n).map(Tick),
            NextFiring::Never    => None,
        }
    }
}

/// What to do when a device's timer fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickAction {
    /// Submit a search, then call [`RerouteDevice::complete`].
    Search,
    /// No search this time.
    Reschedule(NextFiring),
}

/// Timer change requested by a parameter update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rearm {
    Keep,
    Cancel,
    Schedule(NextFiring),
}

// ── RerouteDevice ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct RerouteDevice {
    vehicle:              VehicleId,
    /// Ticks between periodic searches; 0 = only at insertion.
    period:               u64,
    /// Ticks between pre-insertion searches; 0 = none.
    pre_insertion_period: u64,
    last_routing:         Option<Tick>,
    skip_until:           Option<Tick>,
    pending:              Option<TimerHandle>,
    phase:                DevicePhase,
}

impl RerouteDevice {
    pub fn new(vehicle: VehicleId, period: u64, pre_insertion_period: u64) -> Self {
        Self {
            vehicle,
            period,
            pre_insertion_period,
            last_routing: None,
            skip_until: None,
            pending: None,
            phase: DevicePhase::Unattached,
        }
    }

    /// Rebuild a device from checkpointed state.  The caller arms the timer.
    pub(crate) fn restored(
        vehicle:              VehicleId,
        period:               u64,
        pre_insertion_period: u64,
        last_routing:         Option<Tick>,
        skip_until:           Option<Tick>,
        phase:                DevicePhase,
    ) -> Self {
        Self {
            vehicle,
            period,
            pre_insertion_period,
            last_routing,
            skip_until,
            pending: None,
            phase,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn vehicle(&self) -> VehicleId { self.vehicle }
    pub fn period(&self) -> u64 { self.period }
    pub fn pre_insertion_period(&self) -> u64 { self.pre_insertion_period }
    pub fn last_routing(&self) -> Option<Tick> { self.last_routing }
    pub fn skip_until(&self) -> Option<Tick> { self.skip_until }
    pub fn phase(&self) -> DevicePhase { self.phase }
    pub fn pending(&self) -> Option<TimerHandle> { self.pending }

    /// `true` while searches start from the entry edge rather than the
    /// vehicle's current edge.
    pub fn is_pre_insertion(&self) -> bool {
        self.phase == DevicePhase::WaitingForInsertion
    }

    // ── Timer bookkeeping ─────────────────────────────────────────────────

    /// Record a newly scheduled timer.  Returns the previous handle, which
    /// the caller must cancel.
    pub fn arm(&mut self, handle: TimerHandle) -> Option<TimerHandle> {
        self.pending.replace(handle)
    }

    /// Forget the pending timer and return it.
    pub fn disarm(&mut self) -> Option<TimerHandle> {
        self.pending.take()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Called once when the device is built, before insertion.
    pub fn attach(&mut self, now: Tick) -> NextFiring {
        if self.phase != DevicePhase::Unattached || self.pre_insertion_period == 0 {
            return NextFiring::Never;
        }
        self.phase = DevicePhase::WaitingForInsertion;
        NextFiring::At(now)
    }

    /// Decide what a timer firing at `now` does.
    pub fn poll(&self, now: Tick) -> TickAction {
        let looping = match self.phase {
            DevicePhase::WaitingForInsertion => self.pre_insertion_period > 0,
            DevicePhase::Active => self.period > 0,
            DevicePhase::Unattached | DevicePhase::Detached => false,
        };
        if !looping {
            return TickAction::Reschedule(NextFiring::Never);
        }
        match self.skip_until {
            Some(until) if now < until => TickAction::Reschedule(NextFiring::At(until)),
            _ => TickAction::Search,
        }
    }

    /// A search issued at `now` has been applied.  Returns the next firing
    /// of the current loop.
    pub fn complete(&mut self, now: Tick) -> NextFiring {
        self.last_routing = Some(now);
        match self.phase {
            DevicePhase::WaitingForInsertion => NextFiring::after(self.pre_insertion_period),
            DevicePhase::Active => NextFiring::after(self.period),
            DevicePhase::Unattached | DevicePhase::Detached => NextFiring::Never,
        }
    }

    /// The vehicle entered the network at `now`.
    ///
    /// Returns `None` if the device was already inserted or detached; the
    /// insertion search must then not run.  Otherwise the caller performs
    /// the insertion search and schedules the returned firing.
    pub fn insert(&mut self, now: Tick) -> Option<NextFiring> {
        match self.phase {
            DevicePhase::Active | DevicePhase::Detached => None,
            DevicePhase::Unattached | DevicePhase::WaitingForInsertion => {
                self.phase = DevicePhase::Active;
                self.last_routing = Some(now);
                Some(NextFiring::after(self.period))
            }
        }
    }

    /// Suppress searches before `until`.  Latest call wins.
    pub fn skip_routing(&mut self, until: Tick) {
        self.skip_until = Some(until);
    }

    /// Enter the terminal phase.  Returns the timer the caller must cancel.
    pub fn detach(&mut self) -> Option<TimerHandle> {
        self.phase = DevicePhase::Detached;
        self.pending.take()
    }

    // ── Parameters ────────────────────────────────────────────────────────

    /// Read a parameter.  Durations and times are reported in seconds.
    pub fn parameter(&self, key: &str, clock: &SimClock) -> RerouteResult<String> {
        let secs = |t: Option<Tick>| match t {
            Some(t) => clock.secs_for_ticks(t.0).to_string(),
            None => String::new(),
        };
        match key {
            PERIOD => Ok(clock.secs_for_ticks(self.period).to_string()),
            PRE_INSERTION_PERIOD => Ok(clock.secs_for_ticks(self.pre_insertion_period).to_string()),
            LAST_ROUTING => Ok(secs(self.last_routing)),
            SKIP_UNTIL => Ok(secs(self.skip_until)),
            _ => Err(RerouteError::UnknownParameter { key: key.to_string() }),
        }
    }

    /// Change a duration parameter (`value` in seconds).
    ///
    /// Returns how the pending timer has to change:
    ///
    /// - `period` set to 0 while active cancels the periodic timer;
    ///   raising it from 0 while active schedules `now + period`.
    /// - `pre_insertion_period` set to 0 while waiting ends the pre-insertion
    ///   loop; raising it from 0 before insertion starts the loop on the
    ///   next step.
    ///
    /// Other changes take effect at the next firing.
    pub fn set_parameter(
        &mut self,
        key:   &str,
        value: &str,
        clock: &SimClock,
    ) -> RerouteResult<Rearm> {
        match key {
            PERIOD => {
                let ticks = parse_duration(key, value, clock)?;
                let old = std::mem::replace(&mut self.period, ticks);
                if self.phase != DevicePhase::Active {
                    return Ok(Rearm::Keep);
                }
                Ok(match (old, ticks) {
                    (_, 0) => Rearm::Cancel,
                    (0, n) => Rearm::Schedule(NextFiring::After(n)),
                    _ => Rearm::Keep,
                })
            }
            PRE_INSERTION_PERIOD => {
                let ticks = parse_duration(key, value, clock)?;
                self.pre_insertion_period = ticks;
                Ok(match (self.phase, ticks) {
                    (DevicePhase::WaitingForInsertion, 0) => {
                        self.phase = DevicePhase::Unattached;
                        Rearm::Cancel
                    }
                    (DevicePhase::Unattached, n) if n > 0 => {
                        self.phase = DevicePhase::WaitingForInsertion;
                        Rearm::Schedule(NextFiring::After(1))
                    }
                    _ => Rearm::Keep,
                })
            }
            LAST_ROUTING | SKIP_UNTIL => Err(RerouteError::InvalidParameterValue {
                key:   key.to_string(),
                value: format!("{value} (read-only parameter)"),
            }),
            _ => Err(RerouteError::UnknownParameter { key: key.to_string() }),
        }
    }
}

pub const PERIOD: &str = "period";
pub const PRE_INSERTION_PERIOD: &str = "pre_insertion_period";
pub const LAST_ROUTING: &str = "last_routing";
pub const SKIP_UNTIL: &str = "skip_until";

fn parse_duration(key: &str, value: &str, clock: &SimClock) -> RerouteResult<u64> {
    match value.trim().parse::<f64>().ok().and_then(|secs| clock.duration_ticks(secs)) {
        Some(ticks) => Ok(ticks),
        None => Err(RerouteError::InvalidParameterValue {
            key:   key.to_string(),
            value: value.to_string(),
        }),
    }
}
