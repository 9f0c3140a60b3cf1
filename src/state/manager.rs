//! Session/auth manager: the single writer of the session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every component that needs to know who is logged in holds a clone of
//! `SessionManager` (or a `watch::Receiver` from `subscribe`). Every
//! authenticated HTTP call goes through `send_authorized`, which attaches the
//! bearer token and performs the refresh protocol.
//!
//! DESIGN
//! ======
//! - The snapshot lives in a `watch` channel. Only this module sends on it;
//!   readers never touch the persistent store.
//! - The persisted pair is written before the in-memory pair changes. A
//!   storage failure never leaves memory holding a session the store lost.
//! - A 401 triggers at most one refresh per original request. Refreshes are
//!   serialized behind `refresh_gate`; a request whose stale token has already
//!   been rotated by another refresh just retries with the current token.
//! - Every transition that checks the session and then writes the store and
//!   the snapshot runs under the `transition` lock, with no await inside. A
//!   refresh result is applied only if its stale token is still live when it
//!   arrives, so a logout or newer login during the call is never undone.
//!
//! TRADE-OFFS
//! ==========
//! Any refresh failure (rejection, outage, timeout, malformed body) ends the
//! session. Keeping a token the server may have already revoked is worse than
//! asking the user to log in again.

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;

use std::sync::{Arc, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};

use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::net::api::ApiClient;
use crate::net::transport::{ApiRequest, ApiResponse, Transport};
use crate::net::types::{RefreshPayload, User, parse_current_user, parse_refresh_payload};
use crate::routes::Route;
use crate::state::session::Session;
use crate::state::store::{self, SessionStore};
use crate::util::navigate::{NavigateOptions, Navigator};

pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in again";

/// Result of [`SessionManager::hydrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hydration {
    /// Nothing usable was persisted.
    Anonymous,
    /// The persisted session was confirmed by the backend.
    Verified,
    /// The backend could not be asked; the persisted session is kept and the
    /// reason is recorded in `Session::error`.
    Unverified(String),
    /// The backend rejected the persisted credentials; the session was
    /// logged out.
    Rejected,
    /// Hydration already ran for this manager.
    Skipped,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<Session>,
    refresh_gate: Mutex<()>,
    transition: std::sync::Mutex<()>,
    hydration_started: AtomicBool,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(Session::hydrating());
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                store,
                navigator,
                state,
                refresh_gate: Mutex::new(()),
                transition: std::sync::Mutex::new(()),
                hydration_started: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// HTTP verbs that go through this manager's interception.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.clone())
    }

    // =========================================================================
    // READERS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.inner.state.borrow().has_role(role)
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    // =========================================================================
    // LOGIN / LOGOUT
    // =========================================================================

    /// Establish a session for `user` with `token`, replacing any current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the pair cannot be persisted and `error`
    /// is set. The previous session is written back and kept; if that write
    /// fails too, the previous session is ended so memory never claims a
    /// session the store has lost.
    pub fn login(&self, user: User, token: String) -> Result<(), AuthError> {
        let _transition = self.transition();
        let store = self.inner.store.as_ref();
        let keys = &self.inner.config.storage_keys;
        if let Err(e) = store::persist_pair(store, keys, &user, &token) {
            tracing::error!(error = %e, "failed to persist session on login");
            let message = format!("Login failed: {e}");
            let previous = self.snapshot();
            let restored = match (&previous.user, &previous.token) {
                (Some(user), Some(token)) => store::persist_pair(store, keys, user, token).is_ok(),
                _ => true,
            };
            if restored {
                self.inner.state.send_modify(|s| s.error = Some(message));
            } else {
                tracing::warn!("previous session could not be re-persisted; logging out");
                self.end_session_locked(Some(&message));
            }
            return Err(AuthError::Storage(e));
        }
        tracing::info!(user_id = %user.id, user_type = %user.user_type, "logged in");
        self.inner.state.send_modify(|s| {
            s.install(user, token);
            s.is_loading = false;
        });
        Ok(())
    }

    /// Drop the session everywhere and go to the login view. Safe to call
    /// when already logged out.
    pub fn logout(&self) {
        let _transition = self.transition();
        self.end_session_locked(None);
    }

    /// Serializes every check-then-write on the session and its store. Never
    /// held across an await.
    fn transition(&self) -> MutexGuard<'_, ()> {
        self.inner.transition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// End the session only if `token` is still the live token. Returns the
    /// token that superseded it otherwise (`None` after a logout).
    fn expire_if_current(&self, token: &str) -> Result<(), Option<String>> {
        let _transition = self.transition();
        match self.token() {
            Some(current) if current == token => {
                self.end_session_locked(Some(SESSION_EXPIRED_MESSAGE));
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Caller holds the transition lock.
    fn end_session_locked(&self, reason: Option<&str>) {
        if let Err(e) = store::clear_pair(self.inner.store.as_ref(), &self.inner.config.storage_keys) {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        let had_session = self.inner.state.send_if_modified(|s| {
            let had_session = s.token.is_some() || s.user.is_some();
            let changed = had_session || s.error.as_deref() != reason;
            s.clear();
            s.error = reason.map(str::to_owned);
            changed
        });
        if had_session {
            tracing::info!(expired = reason.is_some(), "logged out");
        }
        self.inner
            .navigator
            .navigate(Route::Login.path(), NavigateOptions { replace: true });
    }

    // =========================================================================
    // INTERCEPTION
    // =========================================================================

    /// Send `request` with the current bearer token, refreshing once on 401.
    ///
    /// # Errors
    ///
    /// - `AuthError::Unauthorized` for a 401 without a session.
    /// - `AuthError::SessionExpired` when refresh fails or the retried request
    ///   is rejected again; the session has been logged out.
    /// - `AuthError::Status` for any other non-success status, and for a
    ///   retried 401 after the session was replaced by a newer login.
    /// - transport errors as returned by the `Transport`.
    pub async fn send_authorized(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.send_tracking(request).await.map(|(response, _)| response)
    }

    /// Send `request` without credentials. A 401 is returned as a response,
    /// never refreshed.
    pub(crate) async fn send_public(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.inner.transport.send(request, None).await
    }

    /// Like `send_authorized`, also returning the token that produced the
    /// successful response.
    async fn send_tracking(&self, request: &ApiRequest) -> Result<(ApiResponse, Option<String>), AuthError> {
        let token = self.token();
        let response = self.inner.transport.send(request, token.as_deref()).await?;
        if !response.is_unauthorized() {
            return response.error_for_status().map(|r| (r, token));
        }
        let Some(stale) = token else {
            return Err(AuthError::Unauthorized);
        };

        tracing::info!(method = %request.method, path = %request.path, "401 received; refreshing token");
        let fresh = self.refresh_token(&stale).await?;
        let retried = self.inner.transport.send(request, Some(&fresh)).await?;
        if retried.is_unauthorized() {
            tracing::warn!(method = %request.method, path = %request.path, "request rejected again after refresh");
            return match self.expire_if_current(&fresh) {
                Ok(()) | Err(None) => Err(AuthError::SessionExpired),
                // A newer session is not ended by a failure of the old one.
                Err(Some(_)) => Err(AuthError::Status { status: retried.status, body: retried.body }),
            };
        }
        retried.error_for_status().map(|r| (r, Some(fresh)))
    }

    /// Obtain a token newer than `stale`, issuing at most one refresh call.
    ///
    /// The outcome of the refresh call is applied only if `stale` is still
    /// the live token when it arrives. After a logout it is discarded; after a
    /// newer login the caller retries with that login's token.
    async fn refresh_token(&self, stale: &str) -> Result<String, AuthError> {
        let _gate = self.inner.refresh_gate.lock().await;
        match self.token() {
            Some(current) if current != stale => {
                tracing::debug!("token already rotated by a concurrent refresh");
                return Ok(current);
            }
            Some(_) => {}
            None => return Err(AuthError::SessionExpired),
        }

        let limit = self.inner.config.timeouts.refresh();
        let request = ApiRequest::post(self.inner.config.endpoints.refresh.clone());
        let outcome = match tokio::time::timeout(limit, self.inner.transport.send(&request, Some(stale))).await {
            Ok(Ok(response)) if response.is_success() => parse_refresh_payload(&response.body),
            Ok(Ok(response)) => Err(AuthError::Status { status: response.status, body: response.body }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AuthError::Timeout(limit)),
        };
        self.apply_refresh(stale, outcome)
    }

    fn apply_refresh(&self, stale: &str, outcome: Result<RefreshPayload, AuthError>) -> Result<String, AuthError> {
        let _transition = self.transition();
        match self.token() {
            Some(current) if current == stale => {}
            Some(current) => {
                tracing::info!("session replaced during refresh; discarding refresh result");
                return Ok(current);
            }
            None => {
                tracing::info!("session ended during refresh; discarding refresh result");
                return Err(AuthError::SessionExpired);
            }
        }

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "token refresh failed");
                self.end_session_locked(Some(SESSION_EXPIRED_MESSAGE));
                return Err(AuthError::SessionExpired);
            }
        };
        let Some(user) = payload.user.or_else(|| self.user()) else {
            tracing::error!("token refresh returned no user and none is cached");
            self.end_session_locked(Some(SESSION_EXPIRED_MESSAGE));
            return Err(AuthError::SessionExpired);
        };
        let keys = &self.inner.config.storage_keys;
        if let Err(e) = store::persist_pair(self.inner.store.as_ref(), keys, &user, &payload.token) {
            tracing::error!(error = %e, "failed to persist refreshed session");
            self.end_session_locked(Some(SESSION_EXPIRED_MESSAGE));
            return Err(AuthError::SessionExpired);
        }

        let fresh = payload.token;
        self.inner.state.send_modify(|s| s.install(user, fresh.clone()));
        tracing::info!("token refreshed");
        Ok(fresh)
    }

    // =========================================================================
    // HYDRATION / RECONCILIATION
    // =========================================================================

    /// Restore the persisted session and verify it against `/user/me`.
    ///
    /// Runs once per manager; later calls return `Hydration::Skipped`.
    /// `is_loading` is cleared when this returns, whatever the outcome.
    pub async fn hydrate(&self) -> Hydration {
        if self.inner.hydration_started.swap(true, Ordering::SeqCst) {
            return Hydration::Skipped;
        }

        let restored = self.restore();
        let outcome = if restored { self.verify().await } else { Hydration::Anonymous };

        self.inner.state.send_if_modified(|s| {
            let was_loading = s.is_loading;
            s.is_loading = false;
            was_loading
        });
        outcome
    }

    /// Install the persisted pair, if any. A session established before
    /// hydration got here wins over the persisted one. Returns whether there
    /// is a session to verify.
    fn restore(&self) -> bool {
        let _transition = self.transition();
        let store = self.inner.store.as_ref();
        let keys = &self.inner.config.storage_keys;
        let pair = match store::load_pair(store, keys) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable persisted session");
                if let Err(e) = store::clear_pair(store, keys) {
                    tracing::warn!(error = %e, "failed to clear persisted session");
                }
                None
            }
        };
        let Some((user, token)) = pair else {
            return self.token().is_some();
        };
        if self.token().is_some() {
            return true;
        }
        tracing::info!(user_id = %user.id, "restored persisted session");
        self.inner.state.send_modify(|s| s.install(user, token));
        true
    }

    async fn verify(&self) -> Hydration {
        let limit = self.inner.config.timeouts.verify();
        let result = match tokio::time::timeout(limit, self.reconcile_user()).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::Timeout(limit)),
        };
        match result {
            Ok(_) => Hydration::Verified,
            Err(AuthError::SessionExpired) => Hydration::Rejected,
            Err(AuthError::Unauthorized) => {
                self.logout();
                Hydration::Rejected
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not verify persisted session; keeping it");
                let message = format!("Failed to verify session: {}", e.user_message());
                self.inner.state.send_modify(|s| s.error = Some(message.clone()));
                Hydration::Unverified(message)
            }
        }
    }

    /// Fetch the authoritative user from `/user/me` and replace the cached
    /// user with it. The token is not changed.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::send_authorized`], plus `AuthError::Decode`
    /// for a malformed user body.
    pub async fn reconcile_user(&self) -> Result<User, AuthError> {
        let request = ApiRequest::get(self.inner.config.endpoints.me.clone());
        let (response, used) = self.send_tracking(&request).await?;
        let user = parse_current_user(&response.body)?;
        if let Some(used) = used {
            self.replace_user_if_current(&used, &user);
        }
        Ok(user)
    }

    /// Swap in `user` only while `token` is still the live token; a login or
    /// refresh that happened in the meantime wins.
    fn replace_user_if_current(&self, token: &str, user: &User) {
        let _transition = self.transition();
        if self.token().as_deref() != Some(token) {
            tracing::debug!("discarding user reconciliation for a superseded token");
            return;
        }
        let keys = &self.inner.config.storage_keys;
        match serde_json::to_string(user) {
            Ok(json) => {
                if let Err(e) = self.inner.store.set(&keys.user, &json) {
                    tracing::warn!(error = %e, "failed to persist reconciled user");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize reconciled user"),
        }
        self.inner.state.send_if_modified(|s| {
            let changed = s.user.as_ref() != Some(user);
            s.user = Some(user.clone());
            changed
        });
    }
}
