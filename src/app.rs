//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Builds the backend client and the session store once, starts the session
//! task, and mirrors every store snapshot into an `RwSignal<SessionState>`
//! that route guards and pages read. Nothing routed renders until the first
//! session lookup has resolved.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{ParentRoute, Route, Router, Routes},
};

use crate::config::AppConfig;
use crate::net::api::SupabaseClient;
use crate::net::backend::BrowserTimer;
use crate::net::types::Role;
use crate::pages::{
    admin::AdminLayout, admin_dashboard::AdminDashboardPage, admin_orders::AdminOrdersPage,
    admin_templates::AdminTemplatesPage, admin_users::AdminUsersPage, landing::LandingPage, login::LoginPage,
    not_found::NotFoundPage, order::OrderPage, profile::ProfilePage, settings::SettingsPage, shop::ShopPage,
    signup::SignupPage, user::UserLayout,
};
use crate::state::session::{SessionState, SessionStore, session_task};
use crate::util::auth::{PostLoginRedirector, RouteGuard};

/// Root application component.
///
/// Falls back to a configuration error screen when the build environment is
/// missing the backend settings.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    match AppConfig::from_build_env() {
        Ok(config) => view! { <Storefront config/> }.into_any(),
        Err(e) => {
            leptos::logging::error!("invalid configuration: {e}");
            view! {
                <div class="config-error">
                    <h1>"Konfigurasi tidak lengkap"</h1>
                    <p>{e.to_string()}</p>
                </div>
            }
            .into_any()
        }
    }
}

/// Storefront with a valid configuration: contexts, session lifecycle, and routes.
#[component]
fn Storefront(config: AppConfig) -> impl IntoView {
    let client = SupabaseClient::new(&config);
    let store = SessionStore::new(config.session);
    let session = RwSignal::new(store.snapshot());

    let listener = store.subscribe(move |state| {
        if session.try_set(state.clone()).is_some() {
            leptos::logging::log!("session snapshot arrived after unmount");
        }
    });

    let (task, handle) = session_task(store.clone(), client.clone(), BrowserTimer);
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(task);
    #[cfg(not(feature = "csr"))]
    drop(task);

    let cleanup_store = store.clone();
    on_cleanup(move || {
        handle.teardown();
        cleanup_store.unsubscribe(listener);
    });

    provide_context(config);
    provide_context(client);
    provide_context(store);
    provide_context(session);

    view! {
        <Title text="Ciptain"/>

        <Router>
            <Show
                when=move || session.with(SessionState::is_ready)
                fallback=|| view! { <div class="app-loading">"Memuat sesi pengguna..."</div> }
            >
                <PostLoginRedirector/>
                <Routes fallback=|| view! { <NotFoundPage/> }>
                    <Route path=StaticSegment("") view=LandingPage/>
                    <Route path=StaticSegment("shop") view=ShopPage/>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route path=StaticSegment("signup") view=SignupPage/>
                    <Route
                        path=StaticSegment("profile")
                        view=|| view! { <RouteGuard><ProfilePage/></RouteGuard> }
                    />
                    <ParentRoute
                        path=StaticSegment("user")
                        view=|| view! { <RouteGuard role=Role::User><UserLayout/></RouteGuard> }
                    >
                        <Route path=StaticSegment("") view=ProfilePage/>
                        <Route path=StaticSegment("shop") view=ShopPage/>
                        <Route path=(StaticSegment("order"), ParamSegment("id")) view=OrderPage/>
                    </ParentRoute>
                    <ParentRoute
                        path=StaticSegment("admin")
                        view=|| view! { <RouteGuard role=Role::Admin><AdminLayout/></RouteGuard> }
                    >
                        <Route path=StaticSegment("") view=AdminDashboardPage/>
                        <Route path=StaticSegment("templates") view=AdminTemplatesPage/>
                        <Route path=StaticSegment("orders") view=AdminOrdersPage/>
                        <Route path=StaticSegment("users") view=AdminUsersPage/>
                        <Route path=StaticSegment("settings") view=SettingsPage/>
                    </ParentRoute>
                </Routes>
            </Show>
        </Router>
    }
}
