//! Wake-up signal between submitters and the hash worker.
//!
//! The signal is sticky: a notification sent while nobody waits is kept and
//! consumed by the next `wait`. Because the worker drains the whole queue after
//! each wake, one retained notification covers any number of pushes, and a push
//! that lands between "queue observed empty" and "worker waits" is never lost.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SignalState {
    notified: bool,
    closed: bool,
}

/// Binary, sticky wake-up flag with a close switch
#[derive(Debug, Default)]
pub struct WakeSignal {
    state: Mutex<SignalState>,
    condvar: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        // The guarded flags are always valid, even after a panic elsewhere
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that work may be available and wake the waiter
    pub fn notify(&self) {
        let mut state = self.lock();
        state.notified = true;
        drop(state);
        self.condvar.notify_one();
    }

    /// Block until notified or closed, consuming the notification.
    ///
    /// Returns `false` once the signal is closed.
    pub fn wait(&self) -> bool {
        let mut state = self.lock();
        while !state.notified && !state.closed {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return false;
        }
        state.notified = false;
        true
    }

    /// Wake every waiter permanently
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
