//! Timed events on the simulation clock
//!
//! Delays are measured in fixed ticks, so deferred spawns are deterministic and
//! stop firing as soon as the engine stops ticking.

/// Deferred engine action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEvent {
    /// Spawn the next element of run `run`
    SpawnNext { run: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: u64,
    seq: u64,
    event: TimedEvent,
}

/// Pending events ordered by due tick, then by scheduling order
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: u64,
    next_seq: u64,
    pending: Vec<Scheduled>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick count
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule(&mut self, delay_ticks: u64, event: TimedEvent) {
        self.pending.push(Scheduled {
            due: self.now + delay_ticks,
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance one tick and return the events that became due
    pub fn advance(&mut self) -> Vec<TimedEvent> {
        self.now += 1;
        let now = self.now;

        let mut due: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.due <= now {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| (s.due, s.seq));
        due.into_iter().map(|s| s.event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_fires_after_delay() {
        let mut timers = TimerQueue::new();
        timers.schedule(3, TimedEvent::SpawnNext { run: 1 });

        assert!(timers.advance().is_empty());
        assert!(timers.advance().is_empty());
        assert_eq!(timers.advance(), vec![TimedEvent::SpawnNext { run: 1 }]);
        assert!(timers.is_empty());
        assert_eq!(timers.now(), 3);
    }

    #[test]
    fn test_events_fire_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(2, TimedEvent::SpawnNext { run: 2 });
        timers.schedule(1, TimedEvent::SpawnNext { run: 1 });
        timers.schedule(2, TimedEvent::SpawnNext { run: 3 });

        assert_eq!(timers.advance(), vec![TimedEvent::SpawnNext { run: 1 }]);
        assert_eq!(
            timers.advance(),
            vec![
                TimedEvent::SpawnNext { run: 2 },
                TimedEvent::SpawnNext { run: 3 }
            ]
        );
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = TimerQueue::new();
        timers.schedule(5, TimedEvent::SpawnNext { run: 3 });
        timers.cancel_all();
        for _ in 0..10 {
            assert!(timers.advance().is_empty());
        }
    }
}
