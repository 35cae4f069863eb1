//! Fallback page for unknown routes.

use leptos::prelude::*;

use crate::util::auth::HOME_PATH;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="not-found-page">
            <h1>"404"</h1>
            <h2>"Halaman tidak ditemukan"</h2>
            <p>"Halaman yang kamu cari tidak ada atau sudah dipindahkan."</p>
            <a class="button button--primary" href=HOME_PATH>"Kembali ke Beranda"</a>
        </div>
    }
}
