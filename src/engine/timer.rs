//! One-shot timers on the audio clock.
//!
//! [`TimerQueue`] is the engine's timer facility: `schedule` returns an
//! opaque handle, `cancel` revokes it, and due timers are popped in
//! fire-time order as the audio clock moves forward. Cancellation is lazy on
//! the heap side: the slot map is the source of truth, and heap entries whose
//! handle no longer resolves are skipped when they surface. Once stale
//! entries outnumber live ones the heap is compacted, so rapid
//! cancel-and-rearm cycles cannot grow it without bound.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use slotmap::{new_key_type, SlotMap};

/// Stale heap entries tolerated beyond twice the live count.
const COMPACT_SLACK: usize = 64;

new_key_type! {
    /// Opaque handle to a scheduled timer.
    pub struct TimerHandle;
}

/// Schedule and revoke one-shot timers carrying an event payload.
pub trait TimerFacility<E> {
    /// Arm a timer firing `delay_ms` after the current clock time.
    fn schedule(&mut self, event: E, delay_ms: f64) -> TimerHandle;

    /// Revoke a pending timer. Returns false if it already fired or was
    /// cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

/// Monotonic time source in seconds.
pub trait AudioClock {
    fn now(&self) -> f64;
}

#[derive(Debug)]
struct Timer<E> {
    fire_at_ms: f64,
    event: E,
}

/// Heap entry; ordered so the earliest (then first-armed) timer is on top.
#[derive(Debug, Clone, Copy)]
struct Due {
    fire_at_ms: f64,
    seq: u64,
    handle: TimerHandle,
}

impl Ord for Due {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at_ms
            .total_cmp(&self.fire_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Due {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Due {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Due {}

#[derive(Debug)]
pub struct TimerQueue<E> {
    now_ms: f64,
    next_seq: u64,
    timers: SlotMap<TimerHandle, Timer<E>>,
    due: BinaryHeap<Due>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_seq: 0,
            timers: SlotMap::with_key(),
            due: BinaryHeap::new(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Timers still waiting to fire.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Heap entries, cancelled ones included.
    pub fn queued_len(&self) -> usize {
        self.due.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(handle)
    }

    /// Absolute fire time of a pending timer.
    pub fn fire_at(&self, handle: TimerHandle) -> Option<f64> {
        self.timers.get(handle).map(|t| t.fire_at_ms)
    }

    pub fn event(&self, handle: TimerHandle) -> Option<&E> {
        self.timers.get(handle).map(|t| &t.event)
    }

    /// Pending timers in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (TimerHandle, f64, &E)> {
        self.timers
            .iter()
            .map(|(handle, timer)| (handle, timer.fire_at_ms, &timer.event))
    }

    fn prune(&mut self) {
        while let Some(head) = self.due.peek() {
            if self.timers.contains_key(head.handle) {
                break;
            }
            self.due.pop();
        }
    }

    fn compact(&mut self) {
        if self.due.len() > 2 * self.timers.len() + COMPACT_SLACK {
            let timers = &self.timers;
            self.due.retain(|d| timers.contains_key(d.handle));
        }
    }

    /// Fire time of the earliest pending timer.
    pub fn next_due_ms(&mut self) -> Option<f64> {
        self.prune();
        self.due.peek().map(|d| d.fire_at_ms)
    }

    /// Pop the earliest timer if it fires at or before `until_ms`. The clock
    /// moves to its fire time.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<(TimerHandle, E)> {
        self.prune();
        let head = *self.due.peek()?;
        if head.fire_at_ms > until_ms {
            return None;
        }

        self.due.pop();
        let timer = self.timers.remove(head.handle)?;
        self.now_ms = self.now_ms.max(timer.fire_at_ms);
        Some((head.handle, timer.event))
    }

    /// Move the clock forward without firing anything. Never moves back.
    pub fn advance_to(&mut self, now_ms: f64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.due.clear();
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerFacility<E> for TimerQueue<E> {
    fn schedule(&mut self, event: E, delay_ms: f64) -> TimerHandle {
        // NaN and negative delays fire immediately.
        let fire_at_ms = self.now_ms + delay_ms.max(0.0);
        let handle = self.timers.insert(Timer { fire_at_ms, event });
        self.due.push(Due {
            fire_at_ms,
            seq: self.next_seq,
            handle,
        });
        self.next_seq += 1;
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let removed = self.timers.remove(handle).is_some();
        if removed {
            self.compact();
        }
        removed
    }
}

impl<E> AudioClock for TimerQueue<E> {
    fn now(&self) -> f64 {
        self.now_ms / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<&'static str>, until_ms: f64) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop_due(until_ms).map(|(_, e)| e)).collect()
    }

    #[test]
    fn test_fires_in_time_order() {
        let mut queue = TimerQueue::new();
        queue.schedule("late", 30.0);
        queue.schedule("early", 10.0);
        queue.schedule("middle", 20.0);

        assert_eq!(drain(&mut queue, 100.0), vec!["early", "middle", "late"]);
        assert_eq!(queue.now_ms(), 30.0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_fire_in_arming_order() {
        let mut queue = TimerQueue::new();
        queue.schedule("a", 5.0);
        queue.schedule("b", 5.0);
        queue.schedule("c", 5.0);

        assert_eq!(drain(&mut queue, 5.0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_respects_until() {
        let mut queue = TimerQueue::new();
        queue.schedule("soon", 10.0);
        queue.schedule("later", 50.0);

        assert_eq!(drain(&mut queue, 10.0), vec!["soon"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due_ms(), Some(50.0));
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut queue = TimerQueue::new();
        let keep = queue.schedule("keep", 10.0);
        let drop = queue.schedule("drop", 5.0);

        assert!(queue.cancel(drop));
        assert!(!queue.cancel(drop), "second cancel is a no-op");
        assert!(queue.is_pending(keep));
        assert_eq!(queue.next_due_ms(), Some(10.0));
        assert_eq!(drain(&mut queue, 100.0), vec!["keep"]);
        assert!(!queue.cancel(keep), "fired timers cannot be cancelled");
    }

    #[test]
    fn test_delays_are_relative_to_clock() {
        let mut queue = TimerQueue::new();
        queue.advance_to(1_000.0);
        let handle = queue.schedule("x", 250.0);

        assert_eq!(queue.fire_at(handle), Some(1_250.0));
        assert_eq!(queue.now(), 1.0);

        queue.advance_to(500.0);
        assert_eq!(queue.now_ms(), 1_000.0, "clock never runs backwards");
    }

    #[test]
    fn test_negative_delay_fires_now() {
        let mut queue = TimerQueue::new();
        queue.advance_to(20.0);
        let handle = queue.schedule("x", -5.0);
        assert_eq!(queue.fire_at(handle), Some(20.0));
    }

    #[test]
    fn test_cancelled_entries_are_compacted() {
        let mut queue = TimerQueue::new();
        let mut handles = Vec::new();
        for _ in 0..1_000 {
            for handle in handles.drain(..) {
                queue.cancel(handle);
            }
            for i in 0..129 {
                handles.push(queue.schedule("tick", i as f64 * 10.0));
            }
        }

        assert_eq!(queue.len(), 129);
        assert!(queue.queued_len() <= 3 * 129 + COMPACT_SLACK);
        assert_eq!(drain(&mut queue, f64::INFINITY).len(), 129);
    }

    #[test]
    fn test_clear() {
        let mut queue = TimerQueue::new();
        queue.schedule("a", 1.0);
        queue.schedule("b", 2.0);
        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.next_due_ms(), None);
    }
}
