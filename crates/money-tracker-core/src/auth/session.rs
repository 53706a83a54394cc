use std::fmt;
use std::sync::RwLock;

use tracing::debug;

use super::{CredentialKey, CredentialStore};

/// Authentication state of the logical session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No tokens; a login is required.
    Anonymous,
    Authenticated,
    /// A 401 was observed and a refresh call is in flight.
    Refreshing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated => "authenticated",
            SessionState::Refreshing => "refreshing",
        };
        f.write_str(name)
    }
}

/// Tracks session state transitions for one client.
#[derive(Debug)]
pub struct SessionTracker {
    state: RwLock<SessionState>,
}

impl SessionTracker {
    pub fn new(initial: SessionState) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Authenticated if a persisted access token exists, else anonymous.
    pub fn from_store(store: &dyn CredentialStore) -> Self {
        let initial = if store.get(CredentialKey::AccessToken).is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        Self::new(initial)
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Login or refresh succeeded.
    pub fn authenticate(&self) {
        self.transition(SessionState::Authenticated);
    }

    pub fn begin_refresh(&self) {
        self.transition(SessionState::Refreshing);
    }

    /// Move to `Anonymous`. Returns false if the session had already ended,
    /// so that end-of-session side effects run once.
    pub fn end(&self) -> bool {
        self.transition(SessionState::Anonymous) != SessionState::Anonymous
    }

    fn transition(&self, next: SessionState) -> SessionState {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        let previous = *state;
        if previous != next {
            debug!(from = %previous, to = %next, "Session state changed");
        }
        *state = next;
        previous
    }
}
