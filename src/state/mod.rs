//! Client-side state modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is the single source of truth for who is signed in. The other
//! modules hold page-scoped lists and the pure reducers that keep them in
//! step with backend writes and realtime changes.

pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod session;
pub mod users;
