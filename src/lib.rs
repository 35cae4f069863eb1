//! # storefront
//!
//! Leptos + WASM client for the Ciptain template storefront.
//!
//! The core is the session-gated navigation: a session store that resolves
//! who is signed in and their role, a route guard for the `/user` and
//! `/admin` areas, and a redirector that moves signed-in users off the
//! public entry pages. Around it sit the shop, ordering, and admin pages,
//! all talking to the hosted backend through `net::api`.

pub mod app;
pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install panic and log hooks, then mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        leptos::logging::warn!("console logger unavailable: {e}");
    }
    leptos::mount::mount_to_body(app::App);
}
