//! Shell shared by every `/user` route: top navigation, account menu with
//! sign-out, and the routed child page.

#[cfg(test)]
#[path = "user_test.rs"]
mod user_test;

use leptos::prelude::*;
use leptos_router::components::Outlet;
use leptos_router::hooks::{use_location, use_navigate};

use crate::net::api::SupabaseClient;
use crate::pages::admin::is_menu_active;
use crate::pages::profile::greeting_name;
use crate::state::session::SessionState;
use crate::util::auth::{LOGIN_PATH, PROFILE_PATH, USER_HOME_PATH};
use crate::util::format::{AVATAR_BUCKET, image_url};

/// Navigation entries in display order.
pub const USER_MENU: [(&str, &str); 2] = [("Dashboard", "/user"), ("Shop", "/user/shop")];

pub(crate) fn nav_class(active: bool) -> &'static str {
    if active { "user-nav-item user-nav-item--active" } else { "user-nav-item" }
}

pub(crate) fn account_menu_class(open: bool) -> &'static str {
    if open { "user-account__menu user-account__menu--open" } else { "user-account__menu" }
}

#[component]
pub fn UserLayout() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let pathname = use_location().pathname;
    let navigate = use_navigate();
    let menu_open = RwSignal::new(false);

    let name = move || session.with(|state| greeting_name(state.profile().loaded(), state.identity()));
    let email = move || session.with(|state| state.identity().and_then(|i| i.email.clone()).unwrap_or_default());
    let avatar = move || {
        session.with(|state| {
            let path = state.profile().loaded().and_then(|p| p.avatar_url.clone());
            client.with_value(|c| image_url(c.base_url(), AVATAR_BUCKET, path.as_deref()))
        })
    };

    let on_logout = move |_| {
        menu_open.set(false);
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
        <div class="user-layout">
            <header class="user-header">
                <a class="user-header__brand" href=USER_HOME_PATH>"Ciptain Studio"</a>
                <nav class="user-header__menu">
                    {USER_MENU
                        .into_iter()
                        .map(|(label, path)| {
                            view! {
                                <a
                                    href=path
                                    class=move || nav_class(is_menu_active(&pathname.get(), path, USER_HOME_PATH))
                                >
                                    {label}
                                </a>
                            }
                        })
                        .collect_view()}
                    <div class="user-account">
                        <button class="user-account__toggle" on:click=move |_| menu_open.update(|open| *open = !*open)>
                            <img class="avatar avatar--small" src=avatar alt="Avatar"/>
                        </button>
                        <div class=move || account_menu_class(menu_open.get())>
                            <p class="user-account__name">{name}</p>
                            <p class="user-account__email">{email}</p>
                            <a href=PROFILE_PATH on:click=move |_| menu_open.set(false)>"Profil Saya"</a>
                            <button class="user-account__logout" on:click=on_logout>"Keluar"</button>
                        </div>
                    </div>
                </nav>
            </header>
            <main class="user-content">
                <Outlet/>
            </main>
            <footer class="user-footer">"Ciptain - Menciptakan Kesan Digital yang Abadi"</footer>
        </div>
    }
}
