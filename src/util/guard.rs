//! Route guard: decide what a navigation may render.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view applies the same decision. It is a pure function of
//! the session snapshot and the requested route, re-evaluated on every
//! navigation and on every session change.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::routes::{Access, Route};
use crate::state::session::Session;
use crate::util::navigate::{NavigateOptions, Navigator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Hydration has not finished; render a placeholder.
    Pending,
    Render(Route),
    /// Discard the requested view and go here instead.
    Redirect(Route),
}

/// Decide what to do with a navigation to `route`.
#[must_use]
pub fn evaluate(session: &Session, route: &Route) -> GuardDecision {
    if session.is_loading {
        return GuardDecision::Pending;
    }
    let authenticated = session.is_authenticated();
    let landing = session.user_type().map_or(Route::Root, Route::landing_for);

    if *route == Route::Root {
        return match (authenticated, landing) {
            (false, _) => GuardDecision::Redirect(Route::Login),
            (true, Route::Root) => GuardDecision::Render(Route::Root),
            (true, landing) => GuardDecision::Redirect(landing),
        };
    }

    match route.access() {
        Access::Public => GuardDecision::Render(route.clone()),
        Access::Authenticated | Access::Role(_) if !authenticated => GuardDecision::Redirect(Route::Login),
        Access::Authenticated => GuardDecision::Render(route.clone()),
        Access::Role(role) if session.has_role(role.as_str()) => GuardDecision::Render(route.clone()),
        Access::Role(_) => GuardDecision::Redirect(landing),
    }
}

/// True when the session has settled and the route needs a login it lacks.
#[must_use]
pub fn should_redirect_unauth(session: &Session, route: &Route) -> bool {
    evaluate(session, route) == GuardDecision::Redirect(Route::Login)
}

/// Keep an already-rendered `route` honest: re-evaluate on every session
/// change and redirect as soon as the decision says so. The task ends after
/// the first redirect or when the session channel closes.
pub fn watch_route(
    mut session_rx: watch::Receiver<Session>,
    route: Route,
    navigator: Arc<dyn Navigator>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let decision = evaluate(&session_rx.borrow_and_update(), &route);
            if let GuardDecision::Redirect(target) = decision {
                tracing::info!(from = route.path(), to = target.path(), "route guard redirect");
                navigator.navigate(target.path(), NavigateOptions { replace: true });
                return;
            }
            if session_rx.changed().await.is_err() {
                return;
            }
        }
    })
}
