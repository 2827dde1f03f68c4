//! Host session hooks.
//!
//! The host raises two events: the session finished loading, and the session
//! is shutting down. The first starts the worker (once per service), the
//! second drops queued work without touching finished results.

use crate::service::FileHashService;
use crate::Result;

/// Session events raised by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// World/session finished loading
    Ready,
    /// Session is being torn down
    Shutdown,
}

/// Effect of handling a [`SessionEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// `true` when this event spawned the worker
    WorkerStarted(bool),
    /// Number of queue entries dropped
    Drained(usize),
}

impl FileHashService {
    /// Session ready: start the worker if it is not running yet
    pub fn on_session_ready(&self) -> Result<bool> {
        self.start_worker()
    }

    /// Session shutdown: drain the queue, cancelling the drained paths
    pub fn on_session_shutdown(&self) -> usize {
        self.drain_pending()
    }

    pub fn on_session_event(&self, event: SessionEvent) -> Result<SessionOutcome> {
        match event {
            SessionEvent::Ready => self.on_session_ready().map(SessionOutcome::WorkerStarted),
            SessionEvent::Shutdown => Ok(SessionOutcome::Drained(self.on_session_shutdown())),
        }
    }
}
