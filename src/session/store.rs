use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::models::Session;
use super::types::SessionSnapshot;

/// Owner of the single process-wide `Session`.
///
/// All access goes through short closures; the lock is never held across an
/// await point.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: Mutex<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // A panic while holding the lock cannot leave the session half-written:
        // every mutation is a single method call on `Session`.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.lock())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read(Session::snapshot)
    }

    /// Clears the session only if it is still at `epoch`.
    /// Returns true when this call removed credentials.
    pub fn clear_if_current(&self, epoch: u64) -> bool {
        self.update(|session| {
            if session.epoch() != epoch {
                debug!(
                    expected_epoch = epoch,
                    current_epoch = session.epoch(),
                    "Session changed since request started, not clearing"
                );
                return false;
            }
            session.clear()
        })
    }
}
