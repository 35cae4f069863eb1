//! Template catalog management (`/admin/templates`).
//!
//! SYSTEM CONTEXT
//! ==============
//! Admins create, edit, and delete templates, upload preview images to the
//! public `templates` bucket, and extend the category tree. Replacing or
//! deleting a template also removes its stored image object.

#[cfg(test)]
#[path = "admin_templates_test.rs"]
mod admin_templates_test;

use leptos::prelude::*;

use crate::net::api::{Query, SortOrder, SupabaseClient};
use crate::net::error::BackendError;
use crate::net::types::{Category, Subcategory, Template};
use crate::util::dialog;
use crate::util::format::{TEMPLATE_BUCKET, format_price, image_url};

pub(crate) const MISSING_REQUIRED: &str = "Lengkapi data wajib";

/// Editable fields of a template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateForm {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub price: String,
    pub image: Option<String>,
}

impl TemplateForm {
    pub fn from_template(template: &Template) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            category: template.category.clone(),
            subcategory: template.subcategory.clone(),
            price: template.price.clone(),
            image: template.image.clone(),
        }
    }

    /// Row to write; id, name, category, and price are required.
    ///
    /// # Errors
    ///
    /// Returns [`MISSING_REQUIRED`] when a required field is blank.
    pub fn validate(&self) -> Result<Template, &'static str> {
        let required = [&self.id, &self.name, &self.category, &self.price];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(MISSING_REQUIRED);
        }
        Ok(Template {
            id: self.id.trim().to_owned(),
            name: self.name.trim().to_owned(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            price: self.price.trim().to_owned(),
            image: self.image.clone().filter(|image| !image.is_empty()),
            created_at: None,
        })
    }
}

/// Object name for a fresh upload: millisecond timestamp plus the file name.
pub fn upload_path(now_ms: u64, file_name: &str) -> String {
    format!("{now_ms}-{file_name}")
}

/// Object name inside the bucket for a stored image URL (its last path segment).
pub fn object_path(image: &str) -> Option<String> {
    image.rsplit('/').next().filter(|segment| !segment.is_empty()).map(str::to_owned)
}

/// Object a new upload replaces; only edits replace an existing image.
pub fn replaced_object(editing: bool, current_image: Option<&str>) -> Option<String> {
    if editing { current_image.and_then(object_path) } else { None }
}

fn templates_query() -> Query {
    Query::new().select("*").order("created_at", SortOrder::Desc)
}

fn by_name() -> Query {
    Query::new().select("*").order("name", SortOrder::Asc)
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Catalog {
    templates: Vec<Template>,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
}

async fn load(client: &SupabaseClient) -> Result<Catalog, BackendError> {
    Ok(Catalog {
        templates: client.select("templates", &templates_query()).await?,
        categories: client.select("categories", &by_name()).await?,
        subcategories: client.select("subcategories", &by_name()).await?,
    })
}

async fn save(client: &SupabaseClient, editing: Option<&str>, row: &Template) -> Result<(), BackendError> {
    match editing {
        Some(id) => client.update("templates", &Query::new().eq("id", id), row).await,
        None => client.insert::<_, serde_json::Value>("templates", std::slice::from_ref(row)).await.map(|_| ()),
    }
}

async fn remove_image(client: &SupabaseClient, image: Option<&str>) {
    let Some(path) = image.and_then(object_path) else {
        return;
    };
    if let Err(e) = client.remove(TEMPLATE_BUCKET, &[path]).await {
        leptos::logging::warn!("image cleanup failed: {e}");
    }
}

#[cfg(feature = "csr")]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn run<F: std::future::Future<Output = ()> + 'static>(task: F) {
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(task);
    #[cfg(not(feature = "csr"))]
    drop(task);
}

#[component]
pub fn AdminTemplatesPage() -> impl IntoView {
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let catalog = RwSignal::new(Catalog::default());
    let loading = RwSignal::new(false);
    let uploading = RwSignal::new(false);
    let show_form = RwSignal::new(false);
    let show_category_form = RwSignal::new(false);
    let editing = RwSignal::new(None::<String>);
    let form = RwSignal::new(TemplateForm::default());
    let new_category = RwSignal::new(String::new());
    let new_subcategory = RwSignal::new(String::new());
    let new_subcategory_parent = RwSignal::new(String::new());

    let refresh = move || {
        loading.set(true);
        let client = client.get_value();
        run(async move {
            match load(&client).await {
                Ok(loaded) => catalog.set(loaded),
                Err(e) => leptos::logging::warn!("template catalog load failed: {e}"),
            }
            loading.set(false);
        });
    };
    refresh();

    let reset_form = move || {
        show_form.set(false);
        editing.set(None);
        form.set(TemplateForm::default());
    };

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let row = match form.with(TemplateForm::validate) {
            Ok(row) => row,
            Err(message) => {
                dialog::alert(message);
                return;
            }
        };
        loading.set(true);
        let editing_id = editing.get();
        let client = client.get_value();
        run(async move {
            match save(&client, editing_id.as_deref(), &row).await {
                Ok(()) => {
                    reset_form();
                    refresh();
                }
                Err(e) => {
                    leptos::logging::warn!("template save failed: {e}");
                    dialog::alert("Gagal menyimpan template.");
                    loading.set(false);
                }
            }
        });
    };

    let on_image = move |ev: leptos::ev::Event| {
        #[cfg(feature = "csr")]
        {
            let input = event_target::<web_sys::HtmlInputElement>(&ev);
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            uploading.set(true);
            let replaced = replaced_object(editing.get_untracked().is_some(), form.with_untracked(|f| f.image.clone()).as_deref());
            let path = upload_path(now_ms(), &file.name());
            let client = client.get_value();
            run(async move {
                if let Some(old) = replaced {
                    if let Err(e) = client.remove(TEMPLATE_BUCKET, &[old]).await {
                        leptos::logging::warn!("old image not removed: {e}");
                    }
                }
                match client.upload(TEMPLATE_BUCKET, &path, file, false).await {
                    Ok(()) => form.update(|f| f.image = Some(client.public_url(TEMPLATE_BUCKET, &path))),
                    Err(e) => {
                        leptos::logging::warn!("image upload failed: {e}");
                        dialog::alert("Gagal upload gambar");
                    }
                }
                uploading.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = ev;
            uploading.set(false);
        }
    };

    let on_remove_image = move |_| {
        let Some(image) = form.with_untracked(|f| f.image.clone()) else {
            return;
        };
        form.update(|f| f.image = None);
        let client = client.get_value();
        run(async move { remove_image(&client, Some(&image)).await });
    };

    let on_edit = move |template: Template| {
        editing.set(Some(template.id.clone()));
        form.set(TemplateForm::from_template(&template));
        show_form.set(true);
        show_category_form.set(false);
    };

    let on_delete = move |template: Template| {
        if !dialog::confirm(&format!("Hapus {}?", template.name)) {
            return;
        }
        let client = client.get_value();
        run(async move {
            remove_image(&client, template.image.as_deref()).await;
            match client.delete("templates", &Query::new().eq("id", &template.id)).await {
                Ok(()) => refresh(),
                Err(e) => leptos::logging::warn!("template delete failed: {e}"),
            }
        });
    };

    let on_add_category = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let name = new_category.get().trim().to_owned();
        if name.is_empty() {
            return;
        }
        let client = client.get_value();
        run(async move {
            let row = serde_json::json!([{ "name": name }]);
            match client.insert::<_, serde_json::Value>("categories", &row).await {
                Ok(_) => {
                    new_category.set(String::new());
                    refresh();
                }
                Err(e) => leptos::logging::warn!("category insert failed: {e}"),
            }
        });
    };

    let on_add_subcategory = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let name = new_subcategory.get().trim().to_owned();
        let category_id = new_subcategory_parent.get();
        if name.is_empty() || category_id.is_empty() {
            return;
        }
        let client = client.get_value();
        run(async move {
            let row = serde_json::json!([{ "name": name, "category_id": category_id }]);
            match client.insert::<_, serde_json::Value>("subcategories", &row).await {
                Ok(_) => {
                    new_subcategory.set(String::new());
                    new_subcategory_parent.set(String::new());
                    refresh();
                }
                Err(e) => leptos::logging::warn!("subcategory insert failed: {e}"),
            }
        });
    };

    // Subcategories offered for the category picked in the form.
    let form_subcategories = move || {
        catalog.with(|c| {
            let selected = form.with(|f| f.category.clone());
            let parent = c.categories.iter().find(|cat| cat.name == selected).map(|cat| cat.id.clone());
            c.subcategories
                .iter()
                .filter(|sub| Some(&sub.category_id) == parent.as_ref())
                .map(|sub| sub.name.clone())
                .collect::<Vec<_>>()
        })
    };

    view! {
        <div class="admin-templates">
            <header class="admin-templates__header">
                <h1>"Kelola Template"</h1>
                <div class="admin-templates__actions">
                    <button on:click=move |_| {
                        reset_form();
                        show_form.set(true);
                        show_category_form.set(false);
                    }>"Tambah Template"</button>
                    <button on:click=move |_| {
                        show_category_form.update(|v| *v = !*v);
                        show_form.set(false);
                    }>"Kategori"</button>
                </div>
            </header>

            <Show when=move || show_category_form.get()>
                <div class="category-forms">
                    <form on:submit=on_add_category>
                        <input
                            type="text"
                            placeholder="Nama kategori baru"
                            prop:value=move || new_category.get()
                            on:input=move |ev| new_category.set(event_target_value(&ev))
                        />
                        <button type="submit">"Tambah Kategori"</button>
                    </form>
                    <form on:submit=on_add_subcategory>
                        <select
                            prop:value=move || new_subcategory_parent.get()
                            on:change=move |ev| new_subcategory_parent.set(event_target_value(&ev))
                        >
                            <option value="">"Pilih kategori"</option>
                            {move || catalog.with(|c| {
                                c.categories
                                    .iter()
                                    .map(|cat| view! { <option value=cat.id.clone()>{cat.name.clone()}</option> })
                                    .collect_view()
                            })}
                        </select>
                        <input
                            type="text"
                            placeholder="Nama subkategori baru"
                            prop:value=move || new_subcategory.get()
                            on:input=move |ev| new_subcategory.set(event_target_value(&ev))
                        />
                        <button type="submit">"Tambah Subkategori"</button>
                    </form>
                </div>
            </Show>

            <Show when=move || show_form.get()>
                <form class="template-form" on:submit=on_save>
                    <h2>{move || if editing.get().is_some() { "Edit Template" } else { "Template Baru" }}</h2>
                    <input
                        type="text"
                        placeholder="ID template"
                        disabled=move || editing.get().is_some()
                        prop:value=move || form.with(|f| f.id.clone())
                        on:input=move |ev| form.update(|f| f.id = event_target_value(&ev))
                    />
                    <input
                        type="text"
                        placeholder="Nama template"
                        prop:value=move || form.with(|f| f.name.clone())
                        on:input=move |ev| form.update(|f| f.name = event_target_value(&ev))
                    />
                    <select
                        prop:value=move || form.with(|f| f.category.clone())
                        on:change=move |ev| form.update(|f| {
                            f.category = event_target_value(&ev);
                            f.subcategory.clear();
                        })
                    >
                        <option value="">"Pilih kategori"</option>
                        {move || catalog.with(|c| {
                            c.categories
                                .iter()
                                .map(|cat| view! { <option value=cat.name.clone()>{cat.name.clone()}</option> })
                                .collect_view()
                        })}
                    </select>
                    <select
                        prop:value=move || form.with(|f| f.subcategory.clone())
                        on:change=move |ev| form.update(|f| f.subcategory = event_target_value(&ev))
                    >
                        <option value="">"Pilih subkategori"</option>
                        {move || form_subcategories()
                            .into_iter()
                            .map(|name| view! { <option value=name.clone()>{name.clone()}</option> })
                            .collect_view()}
                    </select>
                    <input
                        type="text"
                        placeholder="Harga (contoh: Rp 25.000)"
                        prop:value=move || form.with(|f| f.price.clone())
                        on:input=move |ev| form.update(|f| f.price = event_target_value(&ev))
                    />
                    <div class="template-form__image">
                        <Show
                            when=move || form.with(|f| f.image.is_some())
                            fallback=move || view! {
                                <input type="file" accept="image/*" disabled=move || uploading.get() on:change=on_image/>
                            }
                        >
                            <img src=move || form.with(|f| f.image.clone().unwrap_or_default()) alt="Preview"/>
                            <button type="button" on:click=on_remove_image>"Hapus Gambar"</button>
                        </Show>
                        <Show when=move || uploading.get()>
                            <span>"Mengupload..."</span>
                        </Show>
                    </div>
                    <div class="template-form__buttons">
                        <button type="submit" disabled=move || loading.get() || uploading.get()>"Simpan"</button>
                        <button type="button" on:click=move |_| reset_form()>"Batal"</button>
                    </div>
                </form>
            </Show>

            <h2>{move || format!("Daftar Template ({})", catalog.with(|c| c.templates.len()))}</h2>
            <Show
                when=move || catalog.with(|c| !c.templates.is_empty())
                fallback=move || view! {
                    <p>{move || if loading.get() { "Memuat..." } else { "Belum ada template." }}</p>
                }
            >
                <div class="template-grid">
                    <For
                        each=move || catalog.with(|c| c.templates.clone())
                        key=|template| (template.id.clone(), template.name.clone(), template.price.clone(), template.image.clone())
                        children=move |template: Template| {
                            let image = client.with_value(|c| image_url(c.base_url(), TEMPLATE_BUCKET, template.image.as_deref()));
                            let edited = template.clone();
                            let deleted = template.clone();
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
                                        <button on:click=move |_| on_edit(edited.clone())>"Edit"</button>
                                        <button class="button--danger" on:click=move |_| on_delete(deleted.clone())>"Hapus"</button>
                                    </div>
                                </article>
                            }
                        }
                    />
                </div>
            </Show>
        </div>
    }
}
