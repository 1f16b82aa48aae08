//! Cancellable virtual-time scheduler.
//!
//! All session timers (settle delays, speaking windows, the one-second clock
//! tick) are entries in a single scheduler owned by the controller, instead of
//! ambient free-running callbacks. The owner drives it by calling
//! [`Scheduler::advance`] from its runtime loop; entries fire in deadline
//! order. Pausing freezes the virtual clock, so every pending entry keeps its
//! remaining duration exactly, and `cancel_all` gives deterministic teardown.
//!
//! Entries scheduled while an `advance` batch is being handled are measured
//! from the end of that call, so cascading timers never fire within the same
//! tick.

use std::time::Duration;

/// Identifies a scheduled entry for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<E> {
    id: u64,
    deadline: Duration,
    period: Option<Duration>,
    event: E,
}

#[derive(Debug)]
pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    paused: bool,
    entries: Vec<Entry<E>>,
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            paused: false,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, deadline: Duration, period: Option<Duration>, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline,
            period,
            event,
        });
        TimerHandle(id)
    }

    /// Schedules a one-shot entry firing `after` from now.
    pub fn schedule_once(&mut self, after: Duration, event: E) -> TimerHandle {
        self.push(self.now + after, None, event)
    }

    /// Schedules a repeating entry with the given period.
    pub fn schedule_repeating(&mut self, period: Duration, event: E) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.push(self.now + period, Some(period), event)
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|e| e.id != handle.0);
    }

    /// Cancels every pending entry unconditionally.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Idempotent. While paused, `advance` is a no-op and remaining durations
    /// are preserved.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Idempotent.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Moves virtual time forward by `dt` and returns the events that became
    /// due, in deadline order (insertion order breaks ties). Repeating entries
    /// re-arm from their previous deadline, so they do not drift.
    pub fn advance(&mut self, dt: Duration) -> Vec<E> {
        if self.paused {
            return Vec::new();
        }
        self.now += dt;
        if self.entries.is_empty() {
            return Vec::new();
        }
        let now = self.now;

        let mut due: Vec<(Duration, u64, E)> = Vec::new();
        for entry in &mut self.entries {
            while entry.deadline <= now {
                due.push((entry.deadline, entry.id, entry.event.clone()));
                match entry.period {
                    Some(period) => entry.deadline += period,
                    None => break,
                }
            }
        }
        self.entries
            .retain(|e| e.period.is_some() || e.deadline > now);

        due.sort_by_key(|(deadline, id, _)| (*deadline, *id));
        due.into_iter().map(|(_, _, event)| event).collect()
    }
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
