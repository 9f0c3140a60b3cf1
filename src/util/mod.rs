//! Helpers shared by the session layer and its front-ends.
//!
//! SYSTEM CONTEXT
//! ==============
//! Navigation and form validation are kept out of the manager so views can
//! reuse them and tests can drive them directly.

pub mod guard;
pub mod navigate;
pub mod validate;
