use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    TimeExpired,
    ScoreBelowZero,
    PlayerQuit,
    LevelGenerationFailed,
    /// A frontend or thread error cut the session short.
    Aborted,
}

/// The session-wide running flag.
///
/// Starts out running and can be stopped exactly once. The first call to
/// [`stop`](RunFlag::stop) records its reason; later calls change nothing.
/// Background agents sleep on it so that a stop wakes them immediately.
#[derive(Debug, Default)]
pub struct RunFlag {
    reason: Mutex<Option<StopReason>>,
    changed: Condvar,
}

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<StopReason>> {
        self.reason.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_none()
    }

    /// The reason recorded by the winning `stop` call, if any.
    pub fn reason(&self) -> Option<StopReason> {
        *self.lock()
    }

    /// Stops the session. Returns `true` if this call performed the
    /// transition, `false` if the session had already stopped.
    pub fn stop(&self, reason: StopReason) -> bool {
        let mut current = self.lock();
        if current.is_some() {
            return false;
        }
        *current = Some(reason);
        drop(current);
        info!(?reason, "session stopping");
        self.changed.notify_all();
        true
    }

    /// Sleeps for `interval` or until the session stops, whichever comes
    /// first. Returns whether the session is still running.
    pub fn sleep(&self, interval: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, interval, |reason| reason.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard.is_none()
    }
}
