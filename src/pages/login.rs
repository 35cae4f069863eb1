//! Email + password login page.
//!
//! A successful sign-in updates the session store through the client's auth
//! broadcast; `PostLoginRedirector` then moves the user to their home route.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;

use crate::net::error::BackendError;
use crate::util::auth::SIGNUP_PATH;

pub(crate) const INVALID_CREDENTIALS: &str = "Email atau password salah.";
const UNEXPECTED_FAILURE: &str = "Terjadi kesalahan, coba lagi nanti.";

/// Trim the email and require both fields.
pub(crate) fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("Email dan password wajib diisi.");
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// Rejected credentials read as a wrong password; anything else is a generic failure.
pub(crate) fn login_error_message(err: &BackendError) -> &'static str {
    match err {
        BackendError::Status { status: 400 | 401 | 403, .. } => INVALID_CREDENTIALS,
        _ => UNEXPECTED_FAILURE,
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    #[cfg(feature = "csr")]
    let client = expect_context::<crate::net::api::SupabaseClient>();

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email_value, password_value) = match validate_login_input(&email.get(), &password.get()) {
            Ok(input) => input,
            Err(message) => {
                error.set(Some(message.to_owned()));
                return;
            }
        };
        busy.set(true);
        error.set(None);

        #[cfg(feature = "csr")]
        {
            let client = client.clone();
            leptos::task::spawn_local(async move {
                match client.sign_in_with_password(&email_value, &password_value).await {
                    Ok(_) => leptos::logging::log!("signed in as {email_value}"),
                    Err(e) => {
                        leptos::logging::warn!("sign in failed: {e}");
                        error.set(Some(login_error_message(&e).to_owned()));
                    }
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (email_value, password_value);
            busy.set(false);
        }
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Masuk ke Ciptain"</h1>
                <Show when=move || error.get().is_some()>
                    <p class="login-message login-message--error">{move || error.get().unwrap_or_default()}</p>
                </Show>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="email"
                        placeholder="Email"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Memproses..." } else { "Masuk" }}
                    </button>
                </form>
                <p class="login-card__footer">
                    "Belum punya akun? "
                    <a href=SIGNUP_PATH>"Daftar"</a>
                </p>
            </div>
        </div>
    }
}
