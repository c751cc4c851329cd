//! Checkpoint persistence of device timer state.
//!
//! # Format
//!
//! One CSV row per device, written in `VehicleId` order:
//!
//! ```text
//! vehicle_id,period,pre_insertion_period,last_routing,skip_until
//! 3,30,1,120,
//! 7,0,1,,150
//! ```
//!
//! Durations and times are in ticks.  An empty `last_routing` or
//! `skip_until` cell means "none".  Rows may appear in any order on load,
//! but a vehicle may appear only once.
//!
//! # Restore
//!
//! A restored device resumes its loop where it left off: the next firing is
//! the later of `last_routing + interval` and `skip_until` if that is still
//! in the future, otherwise one full interval after the restore tick.
//! Restoring never searches immediately.
//!
//! Periods above [`MAX_DURATION_TICKS`] are rejected on load.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use dt_core::{Tick, VehicleId, MAX_DURATION_TICKS};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::device::{DevicePhase, NextFiring, RerouteDevice};
use crate::{RerouteError, RerouteResult};

/// Persisted state of one device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub vehicle_id:           u32,
    pub period:               u64,
    pub pre_insertion_period: u64,
    pub last_routing:         Option<u64>,
    pub skip_until:           Option<u64>,
}

impl DeviceRecord {
    pub fn vehicle(&self) -> VehicleId {
        VehicleId(self.vehicle_id)
    }
}

/// Capture the persistent part of `device`.
pub fn save(device: &RerouteDevice) -> DeviceRecord {
    DeviceRecord {
        vehicle_id:           device.vehicle().0,
        period:               device.period(),
        pre_insertion_period: device.pre_insertion_period(),
        last_routing:         device.last_routing().map(|t| t.0),
        skip_until:           device.skip_until().map(|t| t.0),
    }
}

/// Rebuild a device at restore tick `now`.
///
/// `inserted` tells whether the vehicle is already on the network, which
/// decides the phase.  Returns the device and its first firing; the caller
/// schedules it.
pub fn restore(record: &DeviceRecord, inserted: bool, now: Tick) -> (RerouteDevice, NextFiring) {
    let phase = if inserted {
        DevicePhase::Active
    } else if record.pre_insertion_period > 0 {
        DevicePhase::WaitingForInsertion
    } else {
        DevicePhase::Unattached
    };
    let interval = match phase {
        DevicePhase::Active => record.period,
        DevicePhase::WaitingForInsertion => record.pre_insertion_period,
        DevicePhase::Unattached | DevicePhase::Detached => 0,
    };

    let firing = if interval == 0 {
        NextFiring::Never
    } else {
        let due = record.last_routing.and_then(|t| t.checked_add(interval));
        match due.max(record.skip_until) {
            Some(due) if due > now.0 => NextFiring::At(Tick(due)),
            _ => NextFiring::After(interval),
        }
    };

    let device = RerouteDevice::restored(
        record.vehicle(),
        record.period,
        record.pre_insertion_period,
        record.last_routing.map(Tick),
        record.skip_until.map(Tick),
        phase,
    );
    (device, firing)
}

// ── CSV ───────────────────────────────────────────────────────────────────────

pub fn write_checkpoint<W: Write>(writer: W, records: &[DeviceRecord]) -> RerouteResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Parse a checkpoint.  Duplicate vehicle ids and out-of-range periods are
/// format errors.
pub fn read_checkpoint<R: Read>(reader: R) -> RerouteResult<Vec<DeviceRecord>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut seen = FxHashSet::default();
    let mut records = Vec::new();
    for row in csv.deserialize() {
        let record: DeviceRecord = row?;
        if !seen.insert(record.vehicle_id) {
            return Err(RerouteError::Checkpoint(format!(
                "vehicle {} appears more than once",
                record.vehicle_id
            )));
        }
        if record.period > MAX_DURATION_TICKS || record.pre_insertion_period > MAX_DURATION_TICKS {
            return Err(RerouteError::Checkpoint(format!(
                "vehicle {} has a period above {MAX_DURATION_TICKS} ticks",
                record.vehicle_id
            )));
        }
        records.push(record);
    }
    Ok(records)
}

pub fn save_to_path(path: &Path, records: &[DeviceRecord]) -> RerouteResult<()> {
    write_checkpoint(File::create(path)?, records)
}

pub fn load_from_path(path: &Path) -> RerouteResult<Vec<DeviceRecord>> {
    read_checkpoint(File::open(path)?)
}
