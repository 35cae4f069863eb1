//! Admin order desk (`/admin/orders`).
//!
//! SYSTEM CONTEXT
//! ==============
//! Loads every order once, then keeps a realtime INSERT channel open so new
//! orders appear at the top with a short-lived alert. Status changes are
//! written to `orders` and recorded in `order_logs`.

#[cfg(test)]
#[path = "admin_orders_test.rs"]
mod admin_orders_test;

use leptos::prelude::*;

use crate::net::api::{Query, SortOrder, SupabaseClient};
use crate::net::error::BackendError;
use crate::net::realtime::{self, ChangeEvent, ChannelSpec};
use crate::net::types::{Order, OrderLog, OrderStatus};
use crate::state::orders::{ALL_STATUSES, OrdersState};
use crate::util::format::{format_price, format_rupiah};

/// How long the "new order" banner stays up.
pub const ALERT_DISMISS_MS: u32 = 5_000;

pub(crate) const ORDERS_CHANNEL: ChannelSpec = ChannelSpec { table: "orders", event: ChangeEvent::Insert };

/// Filter chip value to status filter; the "all" chip clears it.
pub(crate) fn status_filter(label: &str) -> Option<OrderStatus> {
    (label != ALL_STATUSES).then(|| OrderStatus::from(label.to_owned()))
}

pub(crate) fn all_orders_query() -> Query {
    Query::new().select("*").order("created_at", SortOrder::Desc)
}

async fn write_status(client: &SupabaseClient, log: &OrderLog) -> Result<(), BackendError> {
    client
        .update("orders", &Query::new().eq("id", &log.order_id), &serde_json::json!({ "status": log.new_status }))
        .await?;
    if let Err(e) = client.insert::<_, serde_json::Value>("order_logs", std::slice::from_ref(log)).await {
        leptos::logging::warn!("order log for {} not written: {e}", log.order_id);
    }
    Ok(())
}

#[component]
pub fn AdminOrdersPage() -> impl IntoView {
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let orders = RwSignal::new(OrdersState::default());

    let refresh = move || {
        orders.update(|o| o.loading = true);
        let client = client.get_value();
        let load = async move {
            match client.select::<Order>("orders", &all_orders_query()).await {
                Ok(rows) => orders.update(|o| {
                    o.orders = rows;
                    o.error = None;
                    o.loading = false;
                }),
                Err(e) => {
                    leptos::logging::warn!("orders load failed: {e}");
                    orders.update(|o| {
                        o.error = Some("Gagal memuat orders".to_owned());
                        o.loading = false;
                    });
                }
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(load);
        #[cfg(not(feature = "csr"))]
        drop(load);
    };
    refresh();

    let channel = client.with_value(|c| {
        realtime::subscribe::<Order, _>(c, ORDERS_CHANNEL, move |change| {
            leptos::logging::log!("order change received");
            let raised = orders.try_update(|o| {
                let before = o.alert_generation;
                o.apply_change(change);
                (o.alert_generation != before).then_some(o.alert_generation)
            });
            let Some(Some(generation)) = raised else {
                return;
            };
            #[cfg(feature = "csr")]
            leptos::task::spawn_local(async move {
                gloo_timers::future::TimeoutFuture::new(ALERT_DISMISS_MS).await;
                orders.try_update(|o| o.dismiss_alert(generation));
            });
            #[cfg(not(feature = "csr"))]
            let _ = generation;
        })
    });
    on_cleanup(move || channel.close());

    let change_status = move |id: String, label: String| {
        let new_status = OrderStatus::from(label);
        let Some(log) = orders.with_untracked(|o| o.plan_status_change(&id, &new_status)) else {
            return;
        };
        let client = client.get_value();
        let write = async move {
            match write_status(&client, &log).await {
                Ok(()) => orders.update(|o| o.set_status(&log.order_id, log.new_status.clone())),
                Err(e) => leptos::logging::warn!("status update for {} failed: {e}", log.order_id),
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(write);
        #[cfg(not(feature = "csr"))]
        drop(write);
    };

    let summary = Memo::new(move |_| orders.with(OrdersState::summary));

    view! {
        <div class="admin-orders">
            <Show when=move || orders.with(|o| o.alert.is_some())>
                <div class="order-alert">
                    <p>{move || orders.with(|o| o.alert.as_ref().map(|a| format!("Order baru dari {}", a.customer_name)).unwrap_or_default())}</p>
                    <p>{move || orders.with(|o| o.alert.as_ref().map(|a| format!("Template: {}", a.template_name)).unwrap_or_default())}</p>
                </div>
            </Show>
            <header class="admin-orders__header">
                <div>
                    <h1>"Manajemen Order"</h1>
                    <p>"Pantau dan kelola semua pesanan pengguna di platform Ciptain."</p>
                </div>
                <button on:click=move |_| refresh() disabled=move || orders.with(|o| o.loading)>
                    {move || if orders.with(|o| o.loading) { "Memuat..." } else { "Refresh" }}
                </button>
            </header>
            <section class="revenue-card">
                <span>"Total Pendapatan"</span>
                <strong>{move || orders.with(|o| format_rupiah(o.revenue()))}</strong>
            </section>
            <section class="stat-grid">
                <div class="stat-card">"Total: " {move || summary.get().total}</div>
                <div class="stat-card">"Menunggu: " {move || summary.get().awaiting_payment}</div>
                <div class="stat-card">"Diproses: " {move || summary.get().processing}</div>
                <div class="stat-card">"Selesai: " {move || summary.get().completed}</div>
                <div class="stat-card">"Dibatalkan: " {move || summary.get().cancelled}</div>
            </section>
            <div class="filter-chips">
                {std::iter::once(ALL_STATUSES.to_owned())
                    .chain(OrderStatus::ALL.iter().map(|status| status.as_str().to_owned()))
                    .map(|label| {
                        let active = label.clone();
                        let chosen = label.clone();
                        view! {
                            <button
                                class=move || {
                                    if orders.with(|o| o.filter == status_filter(&active)) { "chip chip--active" } else { "chip" }
                                }
                                on:click=move |_| orders.update(|o| o.filter = status_filter(&chosen))
                            >
                                {label}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>
            <Show when=move || orders.with(|o| o.error.is_some())>
                <p class="admin-error">{move || orders.with(|o| o.error.clone().unwrap_or_default())}</p>
            </Show>
            <table class="order-table">
                <thead>
                    <tr>
                        <th>"Pelanggan"</th>
                        <th>"Template"</th>
                        <th>"Harga"</th>
                        <th>"Pembayaran"</th>
                        <th>"Status"</th>
                    </tr>
                </thead>
                <tbody>
                    <For
                        each=move || orders.with(|o| o.filtered().into_iter().cloned().collect::<Vec<_>>())
                        key=|order| (order.id.clone(), order.status.clone())
                        children=move |order: Order| {
                            let id = order.id.clone();
                            let current = order.status.as_str().to_owned();
                            view! {
                                <tr>
                                    <td>
                                        <div>{order.customer_name.clone()}</div>
                                        <div class="order-table__sub">{order.customer_phone.clone()}</div>
                                    </td>
                                    <td>{order.template_name.clone()}</td>
                                    <td>{format_price(&order.price)}</td>
                                    <td>{order.payment_method.clone()}</td>
                                    <td>
                                        <select
                                            prop:value=current
                                            on:change=move |ev| change_status(id.clone(), event_target_value(&ev))
                                        >
                                            {OrderStatus::ALL
                                                .iter()
                                                .map(|status| {
                                                    let label = status.as_str().to_owned();
                                                    view! { <option value=label.clone()>{label.clone()}</option> }
                                                })
                                                .collect_view()}
                                        </select>
                                    </td>
                                </tr>
                            }
                        }
                    />
                </tbody>
            </table>
        </div>
    }
}
