//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by the navigation guard on every transition and by the shell at
//! boot. Only `set_user`, `restore_session` and `logout` mutate it.
//!
//! DESIGN
//! ======
//! The identity lives in a single `Option<Identity>` so its id and display
//! name are always set and cleared together, and `is_authenticated` is
//! computed from it rather than stored.
//!
//! Overlapping `restore_session` calls share one in-flight probe (a
//! `Shared` future), so concurrent navigations cost one `GET /me`.
//! Every probe is tagged with the generation current when it started;
//! `set_user` and `logout` bump the generation, and a probe that resolves
//! under an older generation is dropped on the floor. That is what keeps a
//! slow probe from resurrecting a user who has already logged out.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here returns an error. Probe failures degrade to
//! "unauthenticated" and are recorded as a `ProbeOutcome`; logout failures
//! are logged and the local session is cleared regardless.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::net::api::SessionClient;
use crate::net::types::Identity;
use crate::router::{HOME_PATH, Navigator};

type ProbeFuture = Shared<BoxFuture<'static, ()>>;

/// Derived authentication status seen by the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    /// No probe has resolved yet, or one is still in flight.
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Classification of the most recent identity probe that was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Authenticated,
    /// The server answered and there is no valid session.
    NoSession,
    /// Transport failure, 5xx, or an unusable body.
    Unreachable,
}

#[derive(Default)]
struct SessionInner {
    identity: Option<Identity>,
    generation: u64,
    in_flight: Option<ProbeFuture>,
    resolved: bool,
    last_probe: Option<ProbeOutcome>,
}

/// Handle to the process-wide session. Clones share the same state.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<Mutex<SessionInner>>,
    client: Arc<dyn SessionClient>,
    navigator: Arc<dyn Navigator>,
}

impl SessionState {
    /// Create an empty, not-yet-probed session.
    #[must_use]
    pub fn new(client: Arc<dyn SessionClient>, navigator: Arc<dyn Navigator>) -> Self {
        Self { inner: Arc::new(Mutex::new(SessionInner::default())), client, navigator }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().identity.is_some()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    #[must_use]
    pub fn is_restoring(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        let inner = self.lock();
        if inner.identity.is_some() {
            AuthStatus::Authenticated
        } else if inner.in_flight.is_some() || !inner.resolved {
            AuthStatus::Unknown
        } else {
            AuthStatus::Unauthenticated
        }
    }

    #[must_use]
    pub fn last_probe(&self) -> Option<ProbeOutcome> {
        self.lock().last_probe
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Install `identity` as the current user.
    ///
    /// Any probe still in flight is invalidated so it cannot overwrite this.
    pub fn set_user(&self, identity: Identity) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.in_flight = None;
        inner.resolved = true;
        tracing::info!(user_id = %identity.id, "session user set");
        inner.identity = Some(identity);
    }

    /// Ask the server whether the ambient session cookie is still valid.
    ///
    /// No-op when already authenticated. When a probe is already running,
    /// waits for that one instead of starting another.
    pub async fn restore_session(&self) {
        let probe = {
            let mut inner = self.lock();
            if inner.identity.is_some() {
                return;
            }
            if let Some(probe) = &inner.in_flight {
                probe.clone()
            } else {
                let generation = inner.generation;
                let probe = self.clone().run_probe(generation).boxed().shared();
                inner.in_flight = Some(probe.clone());
                probe
            }
        };
        probe.await;
    }

    async fn run_probe(self, generation: u64) {
        tracing::debug!(generation, "identity probe started");
        let result = self.client.fetch_current_user().await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(generation, current = inner.generation, "discarding stale identity probe");
            return;
        }
        inner.in_flight = None;
        inner.resolved = true;

        let outcome = match result {
            Ok(identity) => {
                tracing::info!(user_id = %identity.id, "session restored");
                inner.identity = Some(identity);
                ProbeOutcome::Authenticated
            }
            Err(e) if e.is_unreachable() => {
                tracing::warn!(error = %e, "identity probe failed; continuing unauthenticated");
                ProbeOutcome::Unreachable
            }
            Err(e) if e.is_unauthorized() => {
                tracing::debug!(error = %e, "session cookie rejected");
                ProbeOutcome::NoSession
            }
            Err(e) => {
                tracing::info!(error = %e, "unexpected identity probe response; continuing unauthenticated");
                ProbeOutcome::NoSession
            }
        };
        inner.last_probe = Some(outcome);
    }

    /// End the session on the server, clear it locally, then go home.
    ///
    /// The local clear happens even if the request fails or this future is
    /// dropped while the request is outstanding.
    pub async fn logout(&self) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.in_flight = None;
            inner.generation
        };
        tracing::debug!(generation, "logout started");

        {
            let _clear = ClearOnDrop(self);
            if let Err(e) = self.client.logout().await {
                tracing::warn!(error = %e, "logout request failed; clearing local session anyway");
            }
        }

        tracing::info!("session cleared");
        self.navigator.push(HOME_PATH);
    }

    fn clear(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.in_flight = None;
        inner.identity = None;
        inner.resolved = true;
    }
}

/// Clears the session when dropped, whether or not the logout call finished.
struct ClearOnDrop<'a>(&'a SessionState);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.clear();
    }
}
