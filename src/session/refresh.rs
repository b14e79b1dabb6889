use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::shared::AppError;

/// Result of a refresh, shared by every caller waiting on it
pub type RefreshOutcome = Result<(), AppError>;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Keeps at most one token refresh in flight.
///
/// The first caller starts the refresh; anyone arriving while it runs awaits
/// the same future and receives the same outcome. The slot is emptied once
/// the refresh resolves, so a later expiry triggers a new one.
#[derive(Default)]
pub struct RefreshCoordinator {
    pending: Mutex<Option<PendingRefresh>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Joins the in-flight refresh, or starts one with `start` if none is running
    pub async fn run_or_join<F>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
    {
        let (pending, started) = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(pending) => (pending.clone(), false),
                None => {
                    let pending = start().shared();
                    *slot = Some(pending.clone());
                    (pending, true)
                }
            }
        };

        if started {
            debug!("Started token refresh");
        } else {
            debug!("Joined in-flight token refresh");
        }

        let outcome = pending.clone().await;

        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
            *slot = None;
        }

        outcome
    }

    pub fn in_flight(&self) -> bool {
        self.slot().is_some()
    }
}
