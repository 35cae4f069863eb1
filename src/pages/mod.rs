//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns its route-scoped loading and writes. Validation and list
//! reducers live in `state` or in small pure helpers next to the page so
//! they are testable without a browser.

pub mod admin;
pub mod admin_dashboard;
pub mod admin_orders;
pub mod admin_templates;
pub mod admin_users;
pub mod landing;
pub mod login;
pub mod not_found;
pub mod order;
pub mod profile;
pub mod settings;
pub mod shop;
pub mod signup;
pub mod user;
