//! Single-flight coordination of access token refreshes.
//!
//! Concurrent 401 handlers share one in-flight refresh: the first caller
//! starts it, everyone arriving while it runs awaits the same outcome.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

/// Result of one refresh attempt, shared by every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { access_token: String },
    Failed { reason: String },
}

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
pub struct RefreshCoordinator {
    in_flight: Mutex<Option<(u64, InFlight)>>,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_refreshing(&self) -> bool {
        self.slot().is_some()
    }

    /// Await the in-flight refresh, or start one with `start` if none is
    /// running. `start` is not called when joining.
    pub async fn run<F, Fut>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let (id, refresh) = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some((id, refresh)) => {
                    debug!(refresh_id = id, "Joining in-flight token refresh");
                    (*id, refresh.clone())
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    debug!(refresh_id = id, "Starting token refresh");
                    let refresh = start().boxed().shared();
                    *slot = Some((id, refresh.clone()));
                    (id, refresh)
                }
            }
        };

        let outcome = refresh.await;

        let mut slot = self.slot();
        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
            *slot = None;
        }
        outcome
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<(u64, InFlight)>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
