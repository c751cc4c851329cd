//! Unit tests for dt-schedule.

use dt_core::Tick;

use crate::TimerQueue;

#[cfg(test)]
mod timer_queue {
    use super::*;

    #[test]
    fn new_is_empty() {
        let q: TimerQueue<u32> = TimerQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.next_tick(), None);
    }

    #[test]
    fn drain_returns_due_entries_in_order() {
        let mut q = TimerQueue::new();
        q.schedule(Tick(5), "b");
        q.schedule(Tick(3), "a");
        q.schedule(Tick(5), "c");
        q.schedule(Tick(9), "d");

        let due: Vec<_> = q.drain_due(Tick(5)).into_iter().map(|(_, p)| p).collect();
        assert_eq!(due, vec!["a", "b", "c"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_tick(), Some(Tick(9)));
    }

    #[test]
    fn drain_before_anything_is_due() {
        let mut q = TimerQueue::new();
        q.schedule(Tick(10), 1u32);
        assert!(q.drain_due(Tick(9)).is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn handles_are_unique() {
        let mut q = TimerQueue::new();
        let h1 = q.schedule(Tick(1), ());
        let h2 = q.schedule(Tick(1), ());
        assert_ne!(h1, h2);
    }

    #[test]
    fn cancel_removes_entry() {
        let mut q = TimerQueue::new();
        let h = q.schedule(Tick(4), 7u32);
        q.schedule(Tick(4), 8u32);
        assert!(q.is_pending(h));
        assert_eq!(q.fire_tick(h), Some(Tick(4)));
        assert_eq!(q.cancel(h), Some(7));
        assert!(!q.is_pending(h));
        let due: Vec<_> = q.drain_due(Tick(4)).into_iter().map(|(_, p)| p).collect();
        assert_eq!(due, vec![8]);
    }

    #[test]
    fn cancel_last_entry_drops_bucket() {
        let mut q = TimerQueue::new();
        let h = q.schedule(Tick(4), ());
        q.cancel(h);
        assert_eq!(q.tick_count(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_after_fire_is_none() {
        let mut q = TimerQueue::new();
        let h = q.schedule(Tick(1), 1u32);
        q.drain_due(Tick(1));
        assert_eq!(q.cancel(h), None);
        assert_eq!(q.cancel(h), None);
    }

    #[test]
    fn iter_does_not_consume() {
        let mut q = TimerQueue::new();
        q.schedule(Tick(2), 'x');
        q.schedule(Tick(1), 'y');
        let seen: Vec<_> = q.iter().map(|(t, _, p)| (t, *p)).collect();
        assert_eq!(seen, vec![(Tick(1), 'y'), (Tick(2), 'x')]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn drain_at_max_tick_does_not_overflow() {
        let mut q = TimerQueue::new();
        q.schedule(Tick(u64::MAX), 1u8);
        assert_eq!(q.drain_due(Tick(u64::MAX)).len(), 1);
    }
}
