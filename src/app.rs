//! Application shell: explicit context wiring session, router and notifications.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Shell::boot` is the only way to obtain a router. It awaits one session
//! restoration to completion first, so no route is ever entered while the
//! initial identity check is outstanding.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ShellConfig;
use crate::net::api::SessionClient;
use crate::router::{Navigation, NavigationQueue, RouteTable, Router, RouterError};
use crate::state::auth::{ProbeOutcome, SessionState};
use crate::state::notification::{NotificationChannel, Severity};

pub const UNREACHABLE_NOTICE: &str = "Could not reach the server. You are browsing signed out.";

/// Everything a view needs: session, router, and the notification slot.
pub struct Shell {
    session: SessionState,
    router: Router,
    notifications: NotificationChannel,
}

impl Shell {
    /// Boot with the default route table.
    pub async fn boot(config: &ShellConfig, client: Arc<dyn SessionClient>) -> Self {
        Self::boot_with_routes(config, client, RouteTable::default()).await
    }

    /// Construct all state, restore the session, then attach the router.
    pub async fn boot_with_routes(config: &ShellConfig, client: Arc<dyn SessionClient>, routes: RouteTable) -> Self {
        let queue = Arc::new(NavigationQueue::default());
        let session = SessionState::new(client, queue.clone());
        let notifications = NotificationChannel::new(config.notification_duration);

        session.restore_session().await;
        if session.last_probe() == Some(ProbeOutcome::Unreachable) {
            notifications.show(UNREACHABLE_NOTICE, Severity::Info, None);
        }
        tracing::info!(
            authenticated = session.is_authenticated(),
            base_url = %config.api_base_url,
            "shell booted"
        );

        let router = Router::new(routes, session.clone(), queue);
        Self { session, router, notifications }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    /// Navigate to `path` through the guard.
    ///
    /// # Errors
    ///
    /// Propagates [`RouterError`] from [`Router::navigate`].
    pub async fn navigate(&self, path: &str) -> Result<Navigation, RouterError> {
        self.router.navigate(path).await
    }

    /// Log out and apply the resulting redirect to home.
    ///
    /// # Errors
    ///
    /// Propagates [`RouterError`] if the home route is missing from the table.
    pub async fn logout(&self) -> Result<Option<Navigation>, RouterError> {
        self.session.logout().await;
        let mut last = None;
        for outcome in self.router.flush().await {
            last = Some(outcome?);
        }
        Ok(last)
    }
}
