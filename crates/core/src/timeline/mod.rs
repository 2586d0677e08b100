use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::time::Instant;

/// Source of monotonic time, measured from the clock's own origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Monotonic clock backed by tokio's [`Instant`], so it follows paused test time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        let delta = saturating_nanos(delta);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(delta))
            });
    }

    pub fn set(&self, at: Duration) {
        self.nanos.store(saturating_nanos(at), Ordering::SeqCst);
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Handle to a scheduled timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// One-shot timers ordered by deadline. Timers sharing a deadline fire in the
/// order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<T> {
    pending: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Duration, payload: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((deadline, seq), payload);
        self.deadlines.insert(seq, deadline);
        TimerHandle(seq)
    }

    pub fn schedule_after(&mut self, now: Duration, delay: Duration, payload: T) -> TimerHandle {
        self.schedule_at(now.saturating_add(delay), payload)
    }

    /// Removes a pending timer. Returns its payload if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.pending.remove(&(deadline, handle.0))
    }

    /// Pops the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, T)> {
        let (&(deadline, seq), _) = self.pending.first_key_value()?;
        if deadline > now {
            return None;
        }

        self.deadlines.remove(&seq);
        self.pending
            .remove(&(deadline, seq))
            .map(|payload| (TimerHandle(seq), payload))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let view = clock.clone();
        clock.advance(250 * MS);
        assert_eq!(view.now(), 250 * MS);

        view.set(MS);
        assert_eq!(clock.now(), MS);
    }

    #[test]
    fn manual_clock_saturates_instead_of_wrapping() {
        let clock = ManualClock::new();
        clock.set(Duration::MAX);
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));

        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));

        clock.set(MS);
        clock.advance(Duration::MAX);
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn fires_in_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_at(20 * MS, "late");
        timers.schedule_at(10 * MS, "first");
        timers.schedule_at(10 * MS, "second");

        assert!(timers.pop_due(5 * MS).is_none());
        assert_eq!(timers.next_deadline(), Some(10 * MS));

        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(20 * MS))
            .map(|(_, label)| label)
            .collect();
        assert_eq!(fired, ["first", "second", "late"]);
        assert!(timers.next_deadline().is_none());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut timers = TimerQueue::new();
        let keep = timers.schedule_after(Duration::ZERO, 10 * MS, 1);
        let dropped = timers.schedule_after(Duration::ZERO, 5 * MS, 2);

        assert_eq!(timers.cancel(dropped), Some(2));
        assert_eq!(timers.cancel(dropped), None);

        assert_eq!(timers.pop_due(100 * MS), Some((keep, 1)));
        assert_eq!(timers.cancel(keep), None);
        assert!(timers.pop_due(100 * MS).is_none());
    }
}
