//! Order form for one template (`/user/order/:id`).
//!
//! Saving inserts an `orders` row, then opens the admin's WhatsApp chat with
//! a prefilled confirmation message.

#[cfg(test)]
#[path = "order_test.rs"]
mod order_test;

use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::config::AppConfig;
use crate::net::api::{Query, SupabaseClient};
use crate::net::types::{PaymentMethod, Template};
use crate::state::orders::{OrderForm, build_new_order};
use crate::state::session::SessionState;
use crate::util::auth::{SHOP_PATH, USER_HOME_PATH};
use crate::util::format::{TEMPLATE_BUCKET, format_price, image_url};

/// Route of the order form for `template_id`.
pub fn order_path(template_id: &str) -> String {
    format!("{USER_HOME_PATH}/order/{template_id}")
}

pub(crate) fn template_query(template_id: &str) -> Query {
    Query::new().select("*").eq("id", template_id)
}

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    Loading,
    NotFound,
    Ready(Template),
    Submitted,
}

#[component]
pub fn OrderPage() -> impl IntoView {
    let params = use_params_map();
    let session = expect_context::<RwSignal<SessionState>>();
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let admin_whatsapp = StoredValue::new(expect_context::<AppConfig>().admin_whatsapp);

    let phase = RwSignal::new(Phase::Loading);
    let form = RwSignal::new(session.with_untracked(|state| OrderForm::for_identity(state.identity())));
    let error = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    Effect::new(move || {
        let Some(id) = params.with(|p| p.get("id")) else {
            phase.set(Phase::NotFound);
            return;
        };
        phase.set(Phase::Loading);
        let client = client.get_value();
        let load = async move {
            match client.select_single::<Template>("templates", &template_query(&id)).await {
                Ok(Some(template)) => phase.set(Phase::Ready(template)),
                Ok(None) => phase.set(Phase::NotFound),
                Err(e) => {
                    leptos::logging::warn!("template {id} failed to load: {e}");
                    phase.set(Phase::NotFound);
                }
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(load);
        #[cfg(not(feature = "csr"))]
        drop(load);
    });

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let Phase::Ready(template) = phase.get() else {
            return;
        };
        let user_id = session.with(|state| state.identity().map(|identity| identity.id.clone()));
        let order = match form.with(|f| build_new_order(user_id.as_deref(), &template, f)) {
            Ok(order) => order,
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        busy.set(true);
        error.set(None);

        let client = client.get_value();
        let number = admin_whatsapp.get_value();
        let submit = async move {
            match client.insert::<_, serde_json::Value>("orders", std::slice::from_ref(&order)).await {
                Ok(_) => {
                    leptos::logging::log!("order saved for template {}", order.template_id);
                    open_whatsapp(&number, &crate::state::orders::whatsapp_message(&order, &template));
                    phase.set(Phase::Submitted);
                }
                Err(e) => {
                    leptos::logging::warn!("order insert failed: {e}");
                    error.set(Some(format!("Terjadi kesalahan: {e}")));
                }
            }
            busy.set(false);
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(submit);
        #[cfg(not(feature = "csr"))]
        drop(submit);
    };

    move || match phase.get() {
        Phase::Loading => view! { <div class="order-page order-page--loading">"Memuat template..."</div> }.into_any(),
        Phase::NotFound => view! {
            <div class="order-page order-page--missing">
                <p>"Template tidak ditemukan"</p>
                <a href=SHOP_PATH>"Kembali ke Shop"</a>
            </div>
        }
        .into_any(),
        Phase::Submitted => view! {
            <div class="order-page order-page--done">
                <h2>"Order Berhasil!"</h2>
                <p>"Terima kasih, pesananmu sedang diproses."</p>
                <p>"Kamu akan diarahkan ke WhatsApp admin untuk konfirmasi."</p>
                <a class="button button--primary" href=SHOP_PATH>"Kembali ke Shop"</a>
            </div>
        }
        .into_any(),
        Phase::Ready(template) => {
            let image = client.with_value(|c| image_url(c.base_url(), TEMPLATE_BUCKET, template.image.as_deref()));
            view! {
                <div class="order-page">
                    <a class="order-page__back" href=SHOP_PATH>"Kembali"</a>
                    <h1>"Order Template"</h1>
                    <div class="order-layout">
                        <div class="order-preview">
                            <img src=image alt=template.name.clone()/>
                            <h2>{template.name.clone()}</h2>
                            <p>{format!("{} / {}", template.category, template.subcategory)}</p>
                            <p class="order-preview__price">{format_price(&template.price)}</p>
                        </div>
                        <form class="order-form" on:submit=on_submit>
                            <Show when=move || error.get().is_some()>
                                <p class="order-form__error">{move || error.get().unwrap_or_default()}</p>
                            </Show>
                            <input
                                type="text"
                                placeholder="Nama lengkap"
                                prop:value=move || form.with(|f| f.name.clone())
                                on:input=move |ev| form.update(|f| f.name = event_target_value(&ev))
                            />
                            <input
                                type="email"
                                placeholder="Email"
                                prop:value=move || form.with(|f| f.email.clone())
                                on:input=move |ev| form.update(|f| f.email = event_target_value(&ev))
                            />
                            <input
                                type="tel"
                                placeholder="Nomor WhatsApp (contoh: 081234567890)"
                                prop:value=move || form.with(|f| f.phone.clone())
                                on:input=move |ev| form.update(|f| f.phone = event_target_value(&ev))
                            />
                            <select
                                prop:value=move || form.with(|f| f.payment.label())
                                on:change=move |ev| {
                                    if let Some(payment) = PaymentMethod::from_label(&event_target_value(&ev)) {
                                        form.update(|f| f.payment = payment);
                                    }
                                }
                            >
                                {PaymentMethod::ALL
                                    .into_iter()
                                    .map(|method| view! { <option value=method.label()>{method.label()}</option> })
                                    .collect_view()}
                            </select>
                            <textarea
                                placeholder="Catatan tambahan (opsional)"
                                prop:value=move || form.with(|f| f.note.clone())
                                on:input=move |ev| form.update(|f| f.note = event_target_value(&ev))
                            ></textarea>
                            <button class="button button--primary" type="submit" disabled=move || busy.get()>
                                {move || if busy.get() { "Mengirim..." } else { "Kirim Order" }}
                            </button>
                        </form>
                    </div>
                </div>
            }
            .into_any()
        }
    }
}

/// Open the admin chat in a new tab.
#[cfg(feature = "csr")]
fn open_whatsapp(number: &str, message: &str) {
    let encoded = String::from(js_sys::encode_uri_component(message));
    let link = crate::state::orders::whatsapp_link(number, &encoded);
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.open_with_url_and_target(&link, "_blank") {
            leptos::logging::warn!("could not open WhatsApp: {e:?}");
        }
    }
}

#[cfg(not(feature = "csr"))]
fn open_whatsapp(number: &str, message: &str) {
    log::debug!("WhatsApp confirmation to {number} skipped ({} chars)", message.len());
}
