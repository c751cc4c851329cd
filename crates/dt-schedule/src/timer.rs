//! `TimerQueue`: sparse per-tick queue of one-shot, cancellable timers.
//!
//! # Model
//!
//! A timer fires once.  Whoever owns it decides, when it fires, whether and
//! when to fire again and schedules a fresh entry; the queue never re-arms
//! anything by itself.  This keeps "self-rescheduling" logic in the owner,
//! where it is visible and testable, instead of in hidden callbacks.
//!
//! Every entry gets a unique [`TimerHandle`].  Holding the handle is the only
//! way to cancel an entry, which makes "at most one outstanding timer per
//! owner" a property the owner can check: it stores at most one handle.
//!
//! # Performance note
//!
//! `BTreeMap` gives O(log W) insert and O(log W) drain where W = number of
//! distinct firing ticks currently enqueued.  Cancellation is O(log W + B)
//! where B is the bucket size at the entry's tick.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use dt_core::Tick;

/// Opaque identity of one scheduled entry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// A priority queue mapping simulation ticks → payloads that fire at that tick.
pub struct TimerQueue<T> {
    inner: BTreeMap<Tick, Vec<(TimerHandle, T)>>,
    /// Handle → firing tick, for cancellation and `is_pending`.
    index: HashMap<TimerHandle, Tick>,
    next_handle: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            inner:       BTreeMap::new(),
            index:       HashMap::new(),
            next_handle: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `at` and return its handle.
    pub fn schedule(&mut self, at: Tick, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.inner.entry(at).or_default().push((handle, payload));
        self.index.insert(handle, at);
        handle
    }

    /// Remove a pending entry.  Returns its payload, or `None` if the handle
    /// already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let at = self.index.remove(&handle)?;
        let bucket = self.inner.get_mut(&at)?;
        let pos = bucket.iter().position(|(h, _)| *h == handle)?;
        let (_, payload) = bucket.remove(pos);
        if bucket.is_empty() {
            self.inner.remove(&at);
        }
        Some(payload)
    }

    /// Remove and return every entry due at or before `now`.
    ///
    /// Entries come out in firing-tick order, and in scheduling order within
    /// one tick.
    pub fn drain_due(&mut self, now: Tick) -> Vec<(TimerHandle, T)> {
        let due = match now.0.checked_add(1) {
            Some(next) => {
                let later = self.inner.split_off(&Tick(next));
                std::mem::replace(&mut self.inner, later)
            }
            None => std::mem::take(&mut self.inner),
        };
        let mut fired = Vec::new();
        for (_, bucket) in due {
            for (handle, payload) in bucket {
                self.index.remove(&handle);
                fired.push((handle, payload));
            }
        }
        fired
    }

    /// `true` if `handle` is scheduled and has not fired yet.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }

    /// The tick at which `handle` will fire, if pending.
    pub fn fire_tick(&self, handle: TimerHandle) -> Option<Tick> {
        self.index.get(&handle).copied()
    }

    /// The earliest tick with at least one entry, or `None` if empty.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    /// Iterate over pending entries in firing order without removing them.
    pub fn iter(&self) -> impl Iterator<Item = (Tick, TimerHandle, &T)> + '_ {
        self.inner
            .iter()
            .flat_map(|(&at, bucket)| bucket.iter().map(move |(h, p)| (at, *h, p)))
    }

    /// Total number of pending entries across all future ticks.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of distinct future ticks that have at least one entry.
    pub fn tick_count(&self) -> usize {
        self.inner.len()
    }
}
