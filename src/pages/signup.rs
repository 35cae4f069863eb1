//! Account registration page.
//!
//! Sign-up stores `username` and `phone` in the identity metadata; the
//! backend's profile trigger copies them into the `profiles` row. The
//! confirmation email links back to `/login`.

#[cfg(test)]
#[path = "signup_test.rs"]
mod signup_test;

use leptos::prelude::*;

use crate::util::auth::LOGIN_PATH;

/// Shortest password accepted by sign-up and password change.
pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) const SIGNUP_SUCCESS: &str =
    "Pendaftaran berhasil. Silakan cek email kamu untuk verifikasi akun sebelum login.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SignupInput {
    pub email: String,
    pub password: String,
    pub username: String,
    pub phone: String,
}

impl SignupInput {
    /// Metadata attached to the new identity.
    pub fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut metadata = serde_json::Map::new();
        metadata.insert("username".to_owned(), serde_json::Value::String(self.username.clone()));
        metadata.insert("phone".to_owned(), serde_json::Value::String(self.phone.clone()));
        metadata
    }
}

pub(crate) fn validate_signup(email: &str, password: &str, username: &str, phone: &str) -> Result<SignupInput, &'static str> {
    let email = email.trim();
    if email.is_empty() || password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Email dan password wajib diisi (min. 6 karakter).");
    }
    Ok(SignupInput {
        email: email.to_owned(),
        password: password.to_owned(),
        username: username.trim().to_owned(),
        phone: phone.trim().to_owned(),
    })
}

/// Where the confirmation email sends the user.
pub(crate) fn confirmation_redirect(origin: &str) -> String {
    format!("{}{LOGIN_PATH}", origin.trim_end_matches('/'))
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let username = RwSignal::new(String::new());
    let phone = RwSignal::new(String::new());
    let show_password = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let success = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    #[cfg(feature = "csr")]
    let client = expect_context::<crate::net::api::SupabaseClient>();

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        error.set(None);
        success.set(None);
        let input = match validate_signup(&email.get(), &password.get(), &username.get(), &phone.get()) {
            Ok(input) => input,
            Err(message) => {
                error.set(Some(message.to_owned()));
                return;
            }
        };
        busy.set(true);

        #[cfg(feature = "csr")]
        {
            let client = client.clone();
            let redirect = web_sys::window()
                .and_then(|window| window.location().origin().ok())
                .map(|origin| confirmation_redirect(&origin));
            leptos::task::spawn_local(async move {
                match client.sign_up(&input.email, &input.password, input.metadata(), redirect.as_deref()).await {
                    Ok(_) => {
                        leptos::logging::log!("sign up accepted for {}", input.email);
                        success.set(Some(SIGNUP_SUCCESS.to_owned()));
                    }
                    Err(e) => {
                        leptos::logging::warn!("sign up failed: {e}");
                        error.set(Some(match e {
                            crate::net::error::BackendError::Status { message, .. } if !message.is_empty() => message,
                            _ => "Pendaftaran gagal.".to_owned(),
                        }));
                    }
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = input;
            busy.set(false);
        }
    };

    view! {
        <div class="login-page">
            <form class="login-card login-form" on:submit=on_submit>
                <h1>"Daftar Akun Ciptain"</h1>
                <Show when=move || success.get().is_some()>
                    <p class="login-message login-message--success">{move || success.get().unwrap_or_default()}</p>
                </Show>
                <Show when=move || error.get().is_some()>
                    <p class="login-message login-message--error">{move || error.get().unwrap_or_default()}</p>
                </Show>
                <input
                    class="login-input"
                    type="text"
                    placeholder="Username"
                    required
                    prop:value=move || username.get()
                    on:input=move |ev| username.set(event_target_value(&ev))
                />
                <input
                    class="login-input"
                    type="tel"
                    placeholder="Nomor HP"
                    required
                    prop:value=move || phone.get()
                    on:input=move |ev| phone.set(event_target_value(&ev))
                />
                <input
                    class="login-input"
                    type="email"
                    placeholder="Email"
                    required
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
                <div class="login-input-row">
                    <input
                        class="login-input"
                        type=move || if show_password.get() { "text" } else { "password" }
                        placeholder="Password (min. 6 karakter)"
                        required
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-input-toggle" type="button" on:click=move |_| show_password.update(|v| *v = !*v)>
                        {move || if show_password.get() { "Sembunyikan" } else { "Lihat" }}
                    </button>
                </div>
                <button class="login-button" type="submit" disabled=move || busy.get()>
                    {move || if busy.get() { "Mendaftarkan..." } else { "Daftar" }}
                </button>
                <p class="login-card__footer">
                    "Sudah punya akun? "
                    <a href=LOGIN_PATH>"Masuk"</a>
                </p>
            </form>
        </div>
    }
}
