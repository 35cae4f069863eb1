//! Template shop, shared by the public `/shop` route and the user's `/user/shop`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Anonymous visitors browse read-only and are sent to login for favorites
//! and orders. Once a profile is loaded the same page saves favorites and
//! links each template to the order form.

#[cfg(test)]
#[path = "shop_test.rs"]
mod shop_test;

use leptos::prelude::*;

use crate::net::api::{Query, SortOrder, SupabaseClient};
use crate::net::error::BackendError;
use crate::net::types::{Category, Favorite, Subcategory, Template};
use crate::pages::order::order_path;
use crate::state::catalog::{
    ALL_FILTER, CatalogState, CatalogTab, FavoriteToggle, build_category_map, favorites_header, favorites_subtext,
};
use crate::state::session::SessionState;
use crate::util::auth::LOGIN_PATH;
use crate::util::format::{TEMPLATE_BUCKET, ViewMode, format_price, image_url, view_mode};

/// Everything the shop fetches on mount.
#[derive(Debug, Default)]
pub(crate) struct CatalogData {
    pub templates: Vec<Template>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub favorites: Vec<Favorite>,
}

pub(crate) fn favorites_query(user_id: &str) -> Query {
    Query::new().select("*").eq("user_id", user_id)
}

pub(crate) fn favorite_delete_query(user_id: &str, template_id: &str) -> Query {
    Query::new().eq("user_id", user_id).eq("template_id", template_id)
}

pub(crate) async fn load_catalog(client: &SupabaseClient, user_id: Option<&str>) -> Result<CatalogData, BackendError> {
    let templates = client.select("templates", &Query::new().select("*").order("created_at", SortOrder::Desc)).await?;
    let categories = client.select("categories", &Query::new().select("id,name")).await.unwrap_or_else(|e| {
        leptos::logging::warn!("categories unavailable: {e}");
        Vec::new()
    });
    let subcategories = client.select("subcategories", &Query::new().select("id,name,category_id")).await.unwrap_or_else(|e| {
        leptos::logging::warn!("subcategories unavailable: {e}");
        Vec::new()
    });
    let favorites = match user_id {
        Some(user_id) => client.select("favorites", &favorites_query(user_id)).await.unwrap_or_else(|e| {
            leptos::logging::warn!("favorites unavailable: {e}");
            Vec::new()
        }),
        None => Vec::new(),
    };
    Ok(CatalogData { templates, categories, subcategories, favorites })
}

async fn persist_toggle(client: &SupabaseClient, user_id: &str, toggle: &FavoriteToggle) -> Result<(), BackendError> {
    match toggle {
        FavoriteToggle::Add(favorite) => {
            client.insert::<_, serde_json::Value>("favorites", std::slice::from_ref(favorite)).await.map(|_| ())
        }
        FavoriteToggle::Remove { template_id } => client.delete("favorites", &favorite_delete_query(user_id, template_id)).await,
    }
}

#[component]
pub fn ShopPage() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let catalog = RwSignal::new(CatalogState { loading: true, ..CatalogState::default() });
    let notice = RwSignal::new(None::<String>);

    let mode = Memo::new(move |_| session.with(|state| view_mode(state.profile().loaded())));
    let user_id = Memo::new(move |_| session.with(|state| state.identity().map(|identity| identity.id.clone())));

    // Reload whenever the signed-in identity changes so favorites follow the user.
    Effect::new(move || {
        let user = user_id.get();
        catalog.update(|c| c.loading = true);
        let client = client.get_value();
        let load = async move {
            match load_catalog(&client, user.as_deref()).await {
                Ok(data) => catalog.update(|c| {
                    c.categories = build_category_map(&data.categories, &data.subcategories);
                    c.templates = data.templates;
                    c.favorites = data.favorites;
                    c.error = None;
                    c.loading = false;
                }),
                Err(e) => {
                    leptos::logging::warn!("catalog load failed: {e}");
                    catalog.update(|c| {
                        c.error = Some("Gagal memuat data template".to_owned());
                        c.loading = false;
                    });
                }
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(load);
        #[cfg(not(feature = "csr"))]
        drop(load);
    });

    let toggle_favorite = move |template: Template| {
        let user = user_id.get_untracked();
        let plan = catalog.with_untracked(|c| c.plan_toggle(user.as_deref(), &template));
        let (toggle, user) = match (plan, user) {
            (Ok(toggle), Some(user)) => (toggle, user),
            (Err(message), _) => {
                notice.set(Some(message.to_owned()));
                return;
            }
            (Ok(_), None) => return,
        };
        let client = client.get_value();
        let write = async move {
            match persist_toggle(&client, &user, &toggle).await {
                Ok(()) => catalog.update(|c| c.apply_toggle(toggle)),
                Err(e) => leptos::logging::warn!("favorite update failed: {e}"),
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(write);
        #[cfg(not(feature = "csr"))]
        drop(write);
    };

    let favorite_count = move || catalog.with(|c| c.favorites.len());

    view! {
        <div class="shop-page">
            <header class="shop-header">
                <h1>"Template Ciptain"</h1>
                <input
                    class="shop-search"
                    type="search"
                    placeholder="Cari template..."
                    prop:value=move || catalog.with(|c| c.search.clone())
                    on:input=move |ev| catalog.update(|c| c.search = event_target_value(&ev))
                />
                <Show when=move || mode.get() == ViewMode::User>
                    <div class="shop-tabs">
                        <button
                            class=move || tab_class(catalog.with(|c| c.tab) == CatalogTab::All)
                            on:click=move |_| catalog.update(|c| c.tab = CatalogTab::All)
                        >
                            "Semua Template"
                        </button>
                        <button
                            class=move || tab_class(catalog.with(|c| c.tab) == CatalogTab::Favorites)
                            on:click=move |_| catalog.update(|c| c.tab = CatalogTab::Favorites)
                        >
                            {move || format!("Favorit ({})", favorite_count())}
                        </button>
                    </div>
                </Show>
            </header>

            <Show when=move || notice.get().is_some()>
                <div class="shop-notice">
                    <span>{move || notice.get().unwrap_or_default()}</span>
                    <a href=LOGIN_PATH>"Login"</a>
                    <button on:click=move |_| notice.set(None)>"Tutup"</button>
                </div>
            </Show>

            <Show
                when=move || catalog.with(|c| c.tab) == CatalogTab::All
                fallback=move || view! {
                    <div class="shop-favorites-heading">
                        <h2>{move || favorites_header(favorite_count())}</h2>
                        <p>{move || favorites_subtext(favorite_count())}</p>
                    </div>
                }
            >
                <div class="shop-chips">
                    <For
                        each=move || catalog.with(|c| c.categories.iter().map(|entry| entry.name.clone()).collect::<Vec<_>>())
                        key=|name| name.clone()
                        children=move |name: String| {
                            let active_name = name.clone();
                            let click_name = name.clone();
                            view! {
                                <button
                                    class=move || chip_class(catalog.with(|c| c.category.as_deref().unwrap_or(ALL_FILTER) == active_name))
                                    on:click=move |_| catalog.update(|c| c.select_category(&click_name))
                                >
                                    {name}
                                </button>
                            }
                        }
                    />
                </div>
                <div class="shop-chips shop-chips--sub">
                    <For
                        each=move || catalog.with(|c| c.subcategory_chips().to_vec())
                        key=|name| name.clone()
                        children=move |name: String| {
                            let active_name = name.clone();
                            let click_name = name.clone();
                            view! {
                                <button
                                    class=move || chip_class(catalog.with(|c| c.subcategory.as_deref().unwrap_or(ALL_FILTER) == active_name))
                                    on:click=move |_| catalog.update(|c| c.select_subcategory(&click_name))
                                >
                                    {name}
                                </button>
                            }
                        }
                    />
                </div>
            </Show>

            <Show when=move || catalog.with(|c| c.error.is_some())>
                <p class="shop-error">{move || catalog.with(|c| c.error.clone().unwrap_or_default())}</p>
            </Show>

            <Show
                when=move || !catalog.with(|c| c.loading)
                fallback=|| view! { <p class="shop-loading">"Memuat template..."</p> }
            >
                <Show
                    when=move || catalog.with(|c| !c.displayed().is_empty())
                    fallback=|| view! { <p class="shop-empty">"Tidak ada template yang cocok."</p> }
                >
                    <div class="template-grid">
                        <For
                            each=move || catalog.with(|c| c.displayed().into_iter().cloned().collect::<Vec<_>>())
                            key=|template| (template.id.clone(), template.name.clone(), template.price.clone())
                            children=move |template: Template| {
                                let image = client.with_value(|c| image_url(c.base_url(), TEMPLATE_BUCKET, template.image.as_deref()));
                                let favorite_id = template.id.clone();
                                let order_href = order_path(&template.id);
                                let toggled = template.clone();
                                view! {
                                    <article class="template-card">
                                        <img class="template-card__image" src=image alt=template.name.clone()/>
                                        <div class="template-card__body">
                                            <h3>{template.name.clone()}</h3>
                                            <p class="template-card__meta">
                                                {format!("{} / {}", template.category, template.subcategory)}
                                            </p>
                                            <p class="template-card__price">{format_price(&template.price)}</p>
                                        </div>
                                        <div class="template-card__actions">
                                            <button
                                                class=move || {
                                                    if catalog.with(|c| c.is_favorite(&favorite_id)) {
                                                        "favorite-button favorite-button--on"
                                                    } else {
                                                        "favorite-button"
                                                    }
                                                }
                                                on:click=move |_| toggle_favorite(toggled.clone())
                                            >
                                                "♥"
                                            </button>
                                            {move || match mode.get() {
                                                ViewMode::User => view! {
                                                    <a class="button button--primary" href=order_href.clone()>"Pesan"</a>
                                                }.into_any(),
                                                ViewMode::Public => view! {
                                                    <a class="button" href=LOGIN_PATH>"Login untuk memesan"</a>
                                                }.into_any(),
                                            }}
                                        </div>
                                    </article>
                                }
                            }
                        />
                    </div>
                </Show>
            </Show>
        </div>
    }
}

fn tab_class(active: bool) -> &'static str {
    if active { "shop-tab shop-tab--active" } else { "shop-tab" }
}

fn chip_class(active: bool) -> &'static str {
    if active { "chip chip--active" } else { "chip" }
}
