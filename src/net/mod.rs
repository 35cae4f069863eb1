//! Networking modules for the hosted backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `backend` defines the seam the session core depends on, `api` is the
//! HTTP client implementing it, `realtime` streams table changes, and
//! `types` defines the shared wire schema.

pub mod api;
pub mod backend;
pub mod error;
pub mod realtime;
pub mod types;
