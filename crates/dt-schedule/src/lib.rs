//! `dt-schedule`: the simulation's timed-command queue.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`timer`]  | `TimerQueue<T>` (`BTreeMap<Tick, Vec<(TimerHandle, T)>>`), `TimerHandle` |
//!
//! # Command model (summary)
//!
//! ```text
//! handle = queue.schedule(at, payload)     one-shot entry
//! queue.cancel(handle)                     owner went away
//! for (handle, payload) in queue.drain_due(now):
//!     next = owner.tick(now)               owner decides its next firing
//!     queue.schedule(next, payload)        … and re-arms explicitly
//! ```
//!
//! Each step the simulation drains only the entries due at that step,
//! O(active) work instead of O(N).

pub mod timer;

#[cfg(test)]
mod tests;

pub use timer::{TimerHandle, TimerQueue};
