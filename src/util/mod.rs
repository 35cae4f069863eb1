//! Helpers shared by the pages.
//!
//! `auth` turns session snapshots into route decisions and hosts the guard
//! and redirect components. `storage` wraps `localStorage` JSON, `format`
//! renders prices and image URLs, and `dialog` wraps the browser's confirm
//! and alert boxes. Browser access in `storage` and `dialog` is a no-op on
//! host builds.

pub mod auth;
pub mod dialog;
pub mod format;
pub mod storage;
