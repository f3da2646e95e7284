//! The session timer.

use std::time::{Duration, Instant};

use crate::store::SharedStore;

/// Drives the session timer from a periodic schedule.
///
/// The ticker is polled rather than woken: each [`poll`](Self::poll) fires one
/// tick for every whole interval that elapsed since the previous due time.
/// Ticks land in the store, which drops them while the session is not
/// running. Dropping the ticker stops the schedule.
#[derive(Debug)]
pub struct TimerTicker {
    store: SharedStore,
    interval: Duration,
    next_due: Instant,
}

impl TimerTicker {
    /// Starts ticking every `interval` from `now`.
    #[must_use]
    pub fn start(store: SharedStore, interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        log::debug!("ticker started every {interval:?}");
        Self {
            store,
            interval,
            next_due: now + interval,
        }
    }

    /// Fires the ticks due at `now` and returns how many the store accepted.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let mut accepted = 0;
        while self.next_due <= now {
            if self.store.borrow_mut().tick() {
                accepted += 1;
            }
            self.next_due += self.interval;
        }
        accepted
    }

    /// Restarts the schedule from `now`, discarding any partial interval.
    pub fn restart(&mut self, now: Instant) {
        self.next_due = now + self.interval;
    }

    /// Returns when the next tick is due.
    #[must_use]
    pub fn next_due(&self) -> Instant {
        self.next_due
    }
}

impl Drop for TimerTicker {
    fn drop(&mut self) {
        log::debug!("ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::store::SessionStore;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_catches_up_whole_intervals() {
        let store = SessionStore::shared();
        let start = Instant::now();
        let mut ticker = TimerTicker::start(Rc::clone(&store), SECOND, start);

        assert_eq!(ticker.poll(start + Duration::from_millis(999)), 0);
        assert_eq!(ticker.poll(start + Duration::from_millis(3500)), 3);
        assert_eq!(ticker.poll(start + Duration::from_millis(3999)), 0);
        assert_eq!(ticker.poll(start + Duration::from_secs(4)), 1);
        assert_eq!(store.borrow().elapsed_seconds(), 4);
    }

    #[test]
    fn test_paused_intervals_are_not_counted_later() {
        let store = SessionStore::shared();
        let start = Instant::now();
        let mut ticker = TimerTicker::start(Rc::clone(&store), SECOND, start);

        store.borrow_mut().pause();
        assert_eq!(ticker.poll(start + 5 * SECOND), 0);
        store.borrow_mut().resume();
        assert_eq!(ticker.poll(start + 6 * SECOND), 1);
        assert_eq!(store.borrow().elapsed_seconds(), 1);
    }

    #[test]
    fn test_restart_discards_partial_interval() {
        let store = SessionStore::shared();
        let start = Instant::now();
        let mut ticker = TimerTicker::start(Rc::clone(&store), SECOND, start);
        ticker.restart(start + Duration::from_millis(900));
        assert_eq!(ticker.poll(start + SECOND), 0);
        assert_eq!(ticker.next_due(), start + Duration::from_millis(1900));
    }
}
