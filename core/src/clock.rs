//! Page clock: virtual milliseconds and cooperative timers.
//!
//! Timers never run by themselves. The owner pulls due timers one at a time
//! with `next_due()` and dispatches each before pulling the next, so a timer
//! cleared by an earlier callback in the same advance never fires.

use crate::types::Millis;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Once,
    Every(Millis),
}

#[derive(Debug, Clone)]
struct Timer {
    due: Millis,
    repeat: Repeat,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Millis,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Fire once, `delay` ms from now.
    pub fn set_timeout(&mut self, delay: Millis) -> TimerId {
        self.arm(delay, Repeat::Once)
    }

    /// Fire every `period` ms, first at now + period. A zero period would
    /// never let the clock move, so nothing is armed and `None` comes back.
    pub fn set_interval(&mut self, period: Millis) -> Option<TimerId> {
        if period == 0 {
            return None;
        }
        Some(self.arm(period, Repeat::Every(period)))
    }

    /// Disarm a timer. Clearing an unknown or spent id is a no-op.
    pub fn clear(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Ties go to the timer created first. Intervals re-arm.
    pub fn next_due(&mut self, until: Millis) -> Option<TimerId> {
        let (id, due) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(id, t)| (t.due, **id))
            .map(|(id, t)| (*id, t.due))?;

        self.now = self.now.max(due);
        match self.timers.get(&id).map(|t| t.repeat) {
            Some(Repeat::Every(period)) => {
                if let Some(timer) = self.timers.get_mut(&id) {
                    timer.due = due + period;
                }
            }
            _ => {
                self.timers.remove(&id);
            }
        }
        Some(id)
    }

    /// Move the clock forward once every due timer has been drained.
    pub fn advance_to(&mut self, until: Millis) {
        self.now = self.now.max(until);
    }

    fn arm(&mut self, delay: Millis, repeat: Repeat) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            Timer {
                due: self.now + delay,
                repeat,
            },
        );
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue, until: Millis) -> Vec<(TimerId, Millis)> {
        let mut fired = Vec::new();
        while let Some(id) = queue.next_due(until) {
            fired.push((id, queue.now()));
        }
        queue.advance_to(until);
        fired
    }

    #[test]
    fn timeout_fires_once() {
        let mut queue = TimerQueue::new();
        let t = queue.set_timeout(100);
        assert!(drain(&mut queue, 99).is_empty());
        assert_eq!(drain(&mut queue, 500), vec![(t, 100)]);
        assert!(drain(&mut queue, 5_000).is_empty());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn interval_fires_in_time_order_with_timeout() {
        let mut queue = TimerQueue::new();
        let every = queue.set_interval(1000).expect("armed");
        let once = queue.set_timeout(100);
        let fired = drain(&mut queue, 2000);
        assert_eq!(fired, vec![(once, 100), (every, 1000), (every, 2000)]);
        assert_eq!(queue.now(), 2000);
    }

    #[test]
    fn ties_go_to_creation_order() {
        let mut queue = TimerQueue::new();
        let a = queue.set_timeout(50);
        let b = queue.set_timeout(50);
        assert_eq!(drain(&mut queue, 50), vec![(a, 50), (b, 50)]);
    }

    #[test]
    fn cleared_timers_stay_silent() {
        let mut queue = TimerQueue::new();
        let every = queue.set_interval(10).expect("armed");
        assert_eq!(queue.next_due(100), Some(every));
        assert!(queue.clear(every));
        assert_eq!(queue.next_due(100), None);
        assert!(!queue.clear(every));
    }

    #[test]
    fn zero_period_interval_is_not_armed() {
        let mut queue = TimerQueue::new();
        assert_eq!(queue.set_interval(0), None);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.next_due(1_000), None);
    }
}
