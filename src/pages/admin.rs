//! Shell shared by every `/admin` route: sidebar navigation plus the routed
//! child page.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use leptos::prelude::*;
use leptos_router::components::Outlet;
use leptos_router::hooks::{use_location, use_navigate};

use crate::net::api::SupabaseClient;
use crate::state::session::SessionState;
use crate::util::auth::{ADMIN_HOME_PATH, LOGIN_PATH, SHOP_PATH};

/// Sidebar entries in display order.
pub const ADMIN_MENU: [(&str, &str); 5] = [
    ("Dashboard", "/admin"),
    ("Templates", "/admin/templates"),
    ("Orders", "/admin/orders"),
    ("Users", "/admin/users"),
    ("Settings", "/admin/settings"),
];

/// Exact match for the section's `home` entry, prefix match for the others.
pub(crate) fn is_menu_active(current: &str, entry: &str, home: &str) -> bool {
    let current = current.trim_end_matches('/');
    if entry == home {
        return current == home;
    }
    current == entry || current.strip_prefix(entry).is_some_and(|rest| rest.starts_with('/'))
}

#[component]
pub fn AdminLayout() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let pathname = use_location().pathname;
    let navigate = use_navigate();

    let admin_name = move || {
        session.with(|state| {
            state
                .profile()
                .loaded()
                .and_then(|profile| profile.display_name.clone())
                .unwrap_or_else(|| "Administrator".to_owned())
        })
    };

    let on_logout = move |_| {
        let client = client.get_value();
        let navigate = navigate.clone();
        let sign_out = async move {
            client.sign_out().await;
            navigate(LOGIN_PATH, leptos_router::NavigateOptions::default());
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(sign_out);
        #[cfg(not(feature = "csr"))]
        drop(sign_out);
    };

    view! {
        <div class="admin-layout">
            <aside class="admin-sidebar">
                <a class="admin-sidebar__brand" href=ADMIN_HOME_PATH>"Ciptain Admin"</a>
                <p class="admin-sidebar__greeting">{admin_name}</p>
                <nav class="admin-sidebar__menu">
                    {ADMIN_MENU
                        .into_iter()
                        .map(|(label, path)| {
                            view! {
                                <a
                                    href=path
                                    class=move || {
                                        if is_menu_active(&pathname.get(), path, ADMIN_HOME_PATH) {
                                            "admin-menu-item admin-menu-item--active"
                                        } else {
                                            "admin-menu-item"
                                        }
                                    }
                                >
                                    {label}
                                </a>
                            }
                        })
                        .collect_view()}
                </nav>
                <a class="admin-sidebar__preview" href=SHOP_PATH>"Lihat Shop"</a>
                <button class="admin-sidebar__logout" on:click=on_logout>"Logout"</button>
            </aside>
            <main class="admin-content">
                <Outlet/>
            </main>
        </div>
    }
}
