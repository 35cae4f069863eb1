//! Admin landing page: account and catalog counts plus the latest orders.

use leptos::prelude::*;

use crate::net::api::SupabaseClient;
use crate::net::error::BackendError;
use crate::net::types::{Order, Role};
use crate::state::dashboard::{DashboardState, recent_orders_query, role_count_query, template_count_query};
use crate::util::format::{format_price, format_rupiah};

async fn load_dashboard(client: &SupabaseClient) -> Result<DashboardState, BackendError> {
    let users = client.count("profiles", &role_count_query(Role::User)).await?;
    let admins = client.count("profiles", &role_count_query(Role::Admin)).await?;
    let templates = client.count("templates", &template_count_query()).await?;
    let recent_orders = client.select("orders", &recent_orders_query()).await?;
    Ok(DashboardState { users, admins, templates, recent_orders, loading: false, error: None })
}

#[component]
pub fn AdminDashboardPage() -> impl IntoView {
    let client = expect_context::<SupabaseClient>();
    let dashboard = RwSignal::new(DashboardState { loading: true, ..DashboardState::default() });

    let load = async move {
        match load_dashboard(&client).await {
            Ok(loaded) => dashboard.set(loaded),
            Err(e) => {
                leptos::logging::warn!("dashboard load failed: {e}");
                dashboard.update(|d| {
                    d.loading = false;
                    d.error = Some("Gagal memuat data dashboard".to_owned());
                });
            }
        }
    };
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(load);
    #[cfg(not(feature = "csr"))]
    drop(load);

    let stat = move |title: &'static str, value: Signal<String>| {
        view! {
            <div class="stat-card">
                <span class="stat-card__title">{title}</span>
                <span class="stat-card__value">{move || value.get()}</span>
            </div>
        }
    };

    view! {
        <div class="admin-dashboard">
            <header>
                <h1>"Admin Dashboard"</h1>
                <p>"Pantau pengguna, template, dan transaksi di platform Ciptain."</p>
            </header>
            <Show when=move || dashboard.with(|d| d.error.is_some())>
                <p class="admin-error">{move || dashboard.with(|d| d.error.clone().unwrap_or_default())}</p>
            </Show>
            <section class="stat-grid">
                {stat("Pengguna", Signal::derive(move || dashboard.with(|d| d.users.to_string())))}
                {stat("Admin", Signal::derive(move || dashboard.with(|d| d.admins.to_string())))}
                {stat("Template", Signal::derive(move || dashboard.with(|d| d.templates.to_string())))}
                {stat("Order Terbaru", Signal::derive(move || dashboard.with(|d| d.order_count().to_string())))}
                {stat("Pendapatan", Signal::derive(move || dashboard.with(|d| format_rupiah(d.revenue()))))}
            </section>
            <section class="recent-orders">
                <h2>"Order Terbaru"</h2>
                <Show
                    when=move || dashboard.with(|d| !d.recent_orders.is_empty())
                    fallback=move || {
                        view! {
                            <p class="recent-orders__empty">
                                {move || if dashboard.with(|d| d.loading) { "Memuat..." } else { "Belum ada order." }}
                            </p>
                        }
                    }
                >
                    <table class="order-table">
                        <thead>
                            <tr>
                                <th>"Pelanggan"</th>
                                <th>"Template"</th>
                                <th>"Harga"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || dashboard.with(|d| d.recent_orders.clone())
                                key=|order| order.id.clone()
                                children=|order: Order| view! {
                                    <tr>
                                        <td>{order.customer_name.clone()}</td>
                                        <td>{order.template_name.clone()}</td>
                                        <td>{format_price(&order.price)}</td>
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
