//! Networking modules for the CareHive REST backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` sends requests over HTTP, `api` exposes the verbs and auth
//! endpoints callers use, and `types` defines the wire schema.

pub mod api;
pub mod transport;
pub mod types;
