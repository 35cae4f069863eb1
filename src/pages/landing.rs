//! Public landing page.

use leptos::prelude::*;

use crate::util::auth::{LOGIN_PATH, SHOP_PATH, SIGNUP_PATH};

#[component]
pub fn LandingPage() -> impl IntoView {
    view! {
        <div class="landing-page">
            <section class="landing-hero">
                <h1>"Ciptain"</h1>
                <p class="landing-hero__subtitle">
                    "Template desain siap pakai untuk undangan, presentasi, dan media sosial."
                </p>
                <div class="landing-hero__actions">
                    <a class="button button--primary" href=SHOP_PATH>"Jelajahi Template"</a>
                    <a class="button" href=SIGNUP_PATH>"Daftar"</a>
                    <a class="button button--ghost" href=LOGIN_PATH>"Masuk"</a>
                </div>
            </section>
        </div>
    }
}
