//! Signed-in user's home (`/user` and `/profile`).

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use leptos::prelude::*;

use crate::net::api::{Query, SortOrder, SupabaseClient};
use crate::net::error::BackendError;
use crate::net::types::{Identity, Order, Profile};
use crate::state::session::SessionState;
use crate::util::auth::{SHOP_PATH, USER_HOME_PATH};
use crate::util::format::{AVATAR_BUCKET, format_price, image_url};

/// Name used in the greeting: display name, then the email's local part.
pub(crate) fn greeting_name(profile: Option<&Profile>, identity: Option<&Identity>) -> String {
    profile
        .and_then(|p| p.display_name.as_deref())
        .filter(|name| !name.trim().is_empty())
        .or_else(|| identity.and_then(|i| i.email.as_deref()).and_then(|email| email.split('@').next()))
        .filter(|name| !name.is_empty())
        .unwrap_or("Pengguna")
        .to_owned()
}

pub(crate) fn own_orders_query(user_id: &str) -> Query {
    Query::new().select("*").eq("user_id", user_id).order("created_at", SortOrder::Desc)
}

#[derive(Clone, Debug, Default, PartialEq)]
struct UserStats {
    orders: Vec<Order>,
    favorites: u64,
}

async fn load_stats(client: &SupabaseClient, user_id: &str) -> Result<UserStats, BackendError> {
    let orders = client.select("orders", &own_orders_query(user_id)).await?;
    let favorites = client.count("favorites", &Query::new().select("template_id").eq("user_id", user_id)).await?;
    Ok(UserStats { orders, favorites })
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let stats = RwSignal::new(UserStats::default());

    let name = move || session.with(|state| greeting_name(state.profile().loaded(), state.identity()));
    let avatar = move || {
        session.with(|state| {
            let path = state.profile().loaded().and_then(|p| p.avatar_url.clone());
            client.with_value(|c| image_url(c.base_url(), AVATAR_BUCKET, path.as_deref()))
        })
    };

    Effect::new(move || {
        let Some(user_id) = session.with(|state| state.identity().map(|identity| identity.id.clone())) else {
            return;
        };
        let client = client.get_value();
        let load = async move {
            match load_stats(&client, &user_id).await {
                Ok(loaded) => stats.set(loaded),
                Err(e) => leptos::logging::warn!("user stats unavailable: {e}"),
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(load);
        #[cfg(not(feature = "csr"))]
        drop(load);
    });

    view! {
        <div class="user-dashboard">
            <header class="user-dashboard__header">
                <img class="avatar" src=avatar alt="Foto profil"/>
                <h1>{move || format!("Halo, {}", name())}</h1>
            </header>
            <section class="stat-grid">
                <div class="stat-card">
                    <span class="stat-card__title">"Total Order"</span>
                    <span class="stat-card__value">{move || stats.with(|s| s.orders.len())}</span>
                </div>
                <div class="stat-card">
                    <span class="stat-card__title">"Favorit"</span>
                    <span class="stat-card__value">{move || stats.with(|s| s.favorites)}</span>
                </div>
            </section>
            <section class="quick-links">
                <a href=SHOP_PATH>"Jelajahi Shop"</a>
                <a href=format!("{USER_HOME_PATH}/shop")>"Template & Favorit"</a>
            </section>
            <section class="user-orders">
                <h2>"Order Saya"</h2>
                <Show
                    when=move || stats.with(|s| !s.orders.is_empty())
                    fallback=|| view! {
                        <div class="user-orders__empty">
                            <p>"Belum ada order."</p>
                            <a class="button button--primary" href=SHOP_PATH>"Mulai Pilih Template"</a>
                        </div>
                    }
                >
                    <table class="order-table">
                        <thead>
                            <tr>
                                <th>"Template"</th>
                                <th>"Harga"</th>
                                <th>"Pembayaran"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || stats.with(|s| s.orders.clone())
                                key=|order| (order.id.clone(), order.status.clone())
                                children=|order: Order| view! {
                                    <tr>
                                        <td>{order.template_name.clone()}</td>
                                        <td>{format_price(&order.price)}</td>
                                        <td>{order.payment_method.clone()}</td>
                                        <td>{order.status.as_str().to_owned()}</td>
                                    </tr>
                                }
                            />
                        </tbody>
                    </table>
                </Show>
            </section>
        </div>
    }
}
