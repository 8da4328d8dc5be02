//! Route table, pre-navigation hook, and programmatic navigation queue.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every transition goes through `Router::navigate`, which resolves the path,
//! asks the `NavigationGuard` for a decision, and follows redirects until a
//! route is allowed. Code that only needs to *request* a navigation (logout)
//! gets a `Navigator` and never sees the router itself.


pub mod guard;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use guard::{GuardDecision, NavigationGuard};

use crate::state::auth::SessionState;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";

/// Redirect hops followed before a transition is declared a loop.
pub const MAX_REDIRECTS: usize = 4;

// =============================================================================
// ROUTES
// =============================================================================

/// Access policy declared on a route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoutePolicy {
    /// Only reachable with an authenticated session.
    RequiresAuth,
    /// Only reachable without one (login, signup).
    GuestOnly,
    #[default]
    Open,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub path: String,
    pub policy: RoutePolicy,
}

impl Route {
    pub fn new(name: impl Into<String>, path: impl Into<String>, policy: RoutePolicy) -> Self {
        Self { name: name.into(), path: normalize_path(&path.into()), policy }
    }
}

/// Declarative, immutable-after-construction set of routes.
#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    /// Home (open), login and signup (guest-only).
    fn default() -> Self {
        Self {
            routes: vec![
                Route::new("home", HOME_PATH, RoutePolicy::Open),
                Route::new("login", LOGIN_PATH, RoutePolicy::GuestOnly),
                Route::new("signup", SIGNUP_PATH, RoutePolicy::GuestOnly),
            ],
        }
    }
}

impl RouteTable {
    #[must_use]
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route, replacing any existing route with the same path.
    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.retain(|r| r.path != route.path);
        self.routes.push(route);
        self
    }

    /// Find the route for `path`, ignoring query string, fragment and a trailing `/`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

fn normalize_path(raw: &str) -> String {
    let path = raw.split(['?', '#']).next().unwrap_or_default().trim();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        HOME_PATH.to_owned()
    } else if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Fire-and-forget navigation requests, like `router.push` from a store.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
}

/// FIFO of requested paths, drained by [`Router::flush`].
#[derive(Debug, Default)]
pub struct NavigationQueue {
    pending: Mutex<VecDeque<String>>,
}

impl NavigationQueue {
    fn drain(&self) -> Vec<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Navigator for NavigationQueue {
    fn push(&self, path: &str) {
        tracing::debug!(%path, "navigation requested");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(path.to_owned());
    }
}

// =============================================================================
// ROUTER
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("no route matches '{0}'")]
    NotFound(String),
    #[error("redirect loop while navigating to '{0}'")]
    RedirectLoop(String),
}

/// A committed transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    /// The route that was actually entered.
    pub route: Route,
    /// The originally requested route, when the guard redirected.
    pub redirected_from: Option<Route>,
}

pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    queue: Arc<NavigationQueue>,
    current: Mutex<Option<Route>>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, session: SessionState, queue: Arc<NavigationQueue>) -> Self {
        Self { table, guard: NavigationGuard::new(session), queue, current: Mutex::new(None) }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The last route entered, `None` before the first navigation.
    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Handle for code that needs to request navigation.
    #[must_use]
    pub fn navigator(&self) -> Arc<NavigationQueue> {
        Arc::clone(&self.queue)
    }

    /// Run the guard for `path` and enter the resulting route.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NotFound`] if `path` (or a redirect target) has
    /// no route, and [`RouterError::RedirectLoop`] if redirects do not settle
    /// within [`MAX_REDIRECTS`] hops.
    pub async fn navigate(&self, path: &str) -> Result<Navigation, RouterError> {
        let requested = self.resolve(path)?;
        let from = self.current();
        let mut target = requested.clone();

        for _ in 0..=MAX_REDIRECTS {
            let redirect = match self.guard.check(&target, from.as_ref()).await {
                GuardDecision::Allow => {
                    let redirected_from = (target != requested).then_some(requested);
                    *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(target.clone());
                    tracing::info!(path = %target.path, "navigated");
                    return Ok(Navigation { route: target, redirected_from });
                }
                GuardDecision::RedirectToLogin => LOGIN_PATH,
                GuardDecision::RedirectToHome => HOME_PATH,
            };
            tracing::debug!(from = %target.path, to = redirect, "guard redirect");
            target = self.resolve(redirect)?;
        }

        tracing::warn!(%path, "navigation abandoned after too many redirects");
        Err(RouterError::RedirectLoop(path.to_owned()))
    }

    /// Process every queued navigation request in order.
    pub async fn flush(&self) -> Vec<Result<Navigation, RouterError>> {
        let mut outcomes = Vec::new();
        for path in self.queue.drain() {
            outcomes.push(self.navigate(&path).await);
        }
        outcomes
    }

    fn resolve(&self, path: &str) -> Result<Route, RouterError> {
        self.table
            .resolve(path)
            .cloned()
            .ok_or_else(|| RouterError::NotFound(path.to_owned()))
    }
}
