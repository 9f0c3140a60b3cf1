//! Session snapshot for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and role-aware views read this snapshot; only
//! `SessionManager` produces new ones.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::net::types::{User, UserType};

/// Coarse lifecycle state derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Persisted credentials are still being restored or verified.
    Hydrating,
    Anonymous,
    Authenticated,
}

/// Who is logged in and with which token.
///
/// `token` and `user` are set and cleared together by the manager; `token` is
/// the single source of truth for "authenticated".
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    /// True from startup until hydration resolves.
    pub is_loading: bool,
    /// Last human-readable failure, if any.
    pub error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::hydrating()
    }
}

impl Session {
    /// Initial snapshot before hydration has run.
    #[must_use]
    pub fn hydrating() -> Self {
        Self { token: None, user: None, is_loading: true, error: None }
    }

    /// Settled snapshot with no credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { token: None, user: None, is_loading: false, error: None }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// True iff a user is present and its type is the named known role.
    /// Unknown role names never match.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        match (UserType::known(role), &self.user) {
            (Some(role), Some(user)) => user.user_type == role,
            _ => false,
        }
    }

    #[must_use]
    pub fn user_type(&self) -> Option<&UserType> {
        self.user.as_ref().map(|u| &u.user_type)
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Hydrating
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    pub(crate) fn install(&mut self, user: User, token: String) {
        self.user = Some(user);
        self.token = Some(token);
        self.error = None;
    }

    pub(crate) fn clear(&mut self) {
        self.user = None;
        self.token = None;
    }
}
