//! # Manual-Reset Event
//!
//! A binary signal that stays set until explicitly cleared. Any number of
//! waiters are released while it is set.
//!
//! ```text
//!   signal() ──► [ SET ] ──clear()──► [ CLEAR ]
//!                  │                     │
//!             wait() returns        wait() blocks
//! ```
//!
//! Built on `parking_lot::{Mutex, Condvar}`. Waiting blocks the thread, it
//! never spins.

#[cfg(test)]
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Manual-reset event.
#[derive(Debug, Default)]
pub struct ManualResetEvent {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl ManualResetEvent {
    /// Creates a new event in the given state.
    #[must_use]
    pub fn new(initially_signaled: bool) -> Self {
        Self {
            signaled: Mutex::new(initially_signaled),
            cond: Condvar::new(),
        }
    }

    /// Sets the event and wakes every waiter.
    pub fn signal(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.cond.notify_all();
    }

    /// Clears the event. Later waiters block until the next `signal`.
    pub fn clear(&self) {
        *self.signaled.lock() = false;
    }

    /// Blocks until the event is set. Returns immediately if it already is.
    ///
    /// There is no timeout: if nobody signals, this never returns.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.cond.wait(&mut signaled);
        }
    }

    /// Blocks until the event is set or `timeout` elapses.
    ///
    /// Returns `true` if the event was observed set.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut signaled = self.signaled.lock();
        if *signaled {
            return true;
        }
        // wait_while_for re-checks the predicate on spurious wakeups
        let result = self
            .cond
            .wait_while_for(&mut signaled, |set| !*set, timeout);
        !result.timed_out() || *signaled
    }

    /// Returns whether the event is currently set.
    #[inline]
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        assert!(!ManualResetEvent::new(false).is_signaled());
        assert!(ManualResetEvent::new(true).is_signaled());
        assert!(!ManualResetEvent::default().is_signaled());
    }

    #[test]
    fn test_signal_stays_set_until_cleared() {
        let event = ManualResetEvent::new(false);
        event.signal();
        event.wait();
        event.wait();
        assert!(event.is_signaled());

        event.clear();
        assert!(!event.is_signaled());
        assert!(!event.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_signal_releases_all_waiters() {
        let event = Arc::new(ManualResetEvent::new(false));

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let event = Arc::clone(&event);
                thread::spawn(move || event.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        event.signal();

        for waiter in waiters {
            waiter.join().expect("waiter panicked");
        }
    }

    #[test]
    fn test_wait_timeout_sees_late_signal() {
        let event = Arc::new(ManualResetEvent::new(false));
        let signaller = {
            let event = Arc::clone(&event);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                event.signal();
            })
        };

        assert!(event.wait_timeout(Duration::from_secs(5)));
        signaller.join().expect("signaller panicked");
    }
}
