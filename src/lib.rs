//! CareHive session client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The CareHive backend is an external REST service. This crate owns the
//! client side of authentication: who is logged in, which bearer token proves
//! it, how that token is refreshed when it expires, and which views a session
//! may open.
//!
//! ARCHITECTURE
//! ============
//! - `state` holds the session snapshot, its persistence, and the
//!   `SessionManager` that is the single writer of both.
//! - `net` defines the wire DTOs, the `Transport` seam over HTTP, and the
//!   `ApiClient` verbs every caller uses.
//! - `routes` and `util::guard` decide what a navigation may render.
//! - `util::validate` checks form input before it reaches the backend.

pub mod config;
pub mod error;
pub mod net;
pub mod routes;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use error::AuthError;
pub use net::api::ApiClient;
pub use net::types::{User, UserType};
pub use state::manager::SessionManager;
pub use state::session::{Session, SessionPhase};
