//! Session state and its persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is the read-only snapshot, `store` persists the credential pair,
//! and `manager` is the only code that changes either.

pub mod manager;
pub mod session;
pub mod store;
