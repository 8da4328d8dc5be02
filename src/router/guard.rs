//! Pre-navigation guard.
//!
//! DESIGN
//! ======
//! The guard keeps no state of its own; it reads `SessionState::status`.
//! While that status is still `Unknown` it waits for a restoration before
//! deciding, so an early navigation never sees a transient "logged out".
//! Restoration is de-duplicated inside `SessionState`, so any number of
//! simultaneous transitions share one probe.
//!
//! Once a probe has resolved the guard trusts the result and does not probe
//! again on every transition.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use super::{Route, RoutePolicy};
use crate::state::auth::{AuthStatus, SessionState};

/// Outcome for one transition attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

pub struct NavigationGuard {
    session: SessionState,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(session: SessionState) -> Self {
        Self { session }
    }

    /// Decide whether the transition `from -> to` may proceed.
    pub async fn check(&self, to: &Route, from: Option<&Route>) -> GuardDecision {
        if self.session.status() == AuthStatus::Unknown {
            self.session.restore_session().await;
        }

        let decision = decide(to.policy, self.session.is_authenticated());
        tracing::debug!(
            to = %to.path,
            from = from.map_or("-", |r| r.path.as_str()),
            ?decision,
            "guard evaluated"
        );
        decision
    }
}

/// The routing rules proper, independent of how authentication was determined.
#[must_use]
pub fn decide(policy: RoutePolicy, authenticated: bool) -> GuardDecision {
    match policy {
        RoutePolicy::RequiresAuth if !authenticated => GuardDecision::RedirectToLogin,
        RoutePolicy::GuestOnly if authenticated => GuardDecision::RedirectToHome,
        _ => GuardDecision::Allow,
    }
}
