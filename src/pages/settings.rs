//! Account settings (`/admin/settings`): display name, phone, avatar, and
//! password.
//!
//! Profile edits update the session store's profile mirror first so the
//! sidebar greeting and route guards see them at once, then go to the
//! `profiles` row. A failed write puts the previous profile back.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use leptos::prelude::*;

use crate::net::api::{Query, SupabaseClient};
use crate::net::error::BackendError;
use crate::net::types::{Profile, ProfileUpdate};
use crate::pages::signup::MIN_PASSWORD_LEN;
use crate::state::session::{SessionState, SessionStore};
use crate::util::format::{AVATAR_BUCKET, image_url};

/// How long confirmation messages stay visible.
const MESSAGE_MS: u32 = 3_000;

pub(crate) const PROFILE_SAVED: &str = "Profil berhasil diperbarui!";
pub(crate) const PASSWORD_TOO_SHORT: &str = "Password minimal 6 karakter!";
pub(crate) const PASSWORD_CHANGED: &str = "Password berhasil diubah";
pub(crate) const PASSWORD_FAILED: &str = "Gagal mengubah password, coba lagi!";

/// Storage object for a user's avatar upload.
pub fn avatar_path(user_id: &str, file_name: &str) -> String {
    format!("avatars/{user_id}-{file_name}")
}

/// # Errors
///
/// Returns [`PASSWORD_TOO_SHORT`] under the minimum length.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok(())
}

/// Patch for the name and phone fields; a blank phone is left untouched.
pub fn profile_update(display_name: &str, phone: &str) -> ProfileUpdate {
    let phone = phone.trim();
    ProfileUpdate {
        display_name: Some(display_name.trim().to_owned()),
        phone: (!phone.is_empty()).then(|| phone.to_owned()),
        avatar_url: None,
    }
}

/// Mirror `update` into the session store right away, then write it to the
/// profile row. A rejected write restores the previous profile.
async fn write_profile(
    client: &SupabaseClient,
    store: &SessionStore,
    profile: Profile,
    update: ProfileUpdate,
) -> Result<(), BackendError> {
    let mut edited = profile.clone();
    update.apply_to(&mut edited);
    let mirrored = store.set_profile(edited);
    if !mirrored {
        leptos::logging::log!("profile edit for a user who is no longer signed in");
    }

    if let Err(e) = client.update("profiles", &Query::new().eq("id", &profile.id), &update).await {
        if mirrored {
            store.set_profile(profile);
        }
        return Err(e);
    }
    Ok(())
}

fn run<F: std::future::Future<Output = ()> + 'static>(task: F) {
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(task);
    #[cfg(not(feature = "csr"))]
    drop(task);
}

/// Clear `message` after a short delay.
fn flash(message: RwSignal<Option<String>>, text: &str) {
    message.set(Some(text.to_owned()));
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(MESSAGE_MS).await;
        message.set(None);
    });
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let session = expect_context::<RwSignal<SessionState>>();
    let store = StoredValue::new(expect_context::<SessionStore>());
    let client = StoredValue::new(expect_context::<SupabaseClient>());

    let loaded = move || session.with(|state| state.profile().loaded().cloned());
    let initial = session.with_untracked(|state| state.profile().loaded().cloned());
    let email = session.with_untracked(|state| state.identity().and_then(|i| i.email.clone()).unwrap_or_default());

    let display_name = RwSignal::new(initial.as_ref().and_then(|p| p.display_name.clone()).unwrap_or_default());
    let phone = RwSignal::new(initial.as_ref().and_then(|p| p.phone.clone()).unwrap_or_default());
    let busy = RwSignal::new(false);
    let profile_message = RwSignal::new(None::<String>);
    let show_password_form = RwSignal::new(false);
    let show_password = RwSignal::new(false);
    let password = RwSignal::new(String::new());
    let password_message = RwSignal::new(None::<String>);

    let avatar = move || {
        let path = loaded().and_then(|p| p.avatar_url);
        client.with_value(|c| image_url(c.base_url(), AVATAR_BUCKET, path.as_deref()))
    };

    let on_save_profile = move |_| {
        let Some(profile) = loaded() else {
            return;
        };
        let update = profile_update(&display_name.get(), &phone.get());
        busy.set(true);
        let client = client.get_value();
        let store = store.get_value();
        run(async move {
            match write_profile(&client, &store, profile, update).await {
                Ok(()) => flash(profile_message, PROFILE_SAVED),
                Err(e) => {
                    leptos::logging::warn!("profile update failed: {e}");
                    flash(profile_message, "Gagal memperbarui profil.");
                }
            }
            busy.set(false);
        });
    };

    let on_avatar = move |ev: leptos::ev::Event| {
        #[cfg(feature = "csr")]
        {
            let input = event_target::<web_sys::HtmlInputElement>(&ev);
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            let Some(profile) = loaded() else {
                return;
            };
            let path = avatar_path(&profile.id, &file.name());
            busy.set(true);
            let client = client.get_value();
            let store = store.get_value();
            run(async move {
                match client.upload(AVATAR_BUCKET, &path, file, true).await {
                    Ok(()) => {
                        let update = ProfileUpdate {
                            avatar_url: Some(client.public_url(AVATAR_BUCKET, &path)),
                            ..ProfileUpdate::default()
                        };
                        if let Err(e) = write_profile(&client, &store, profile, update).await {
                            leptos::logging::warn!("avatar url not saved: {e}");
                        }
                    }
                    Err(e) => {
                        leptos::logging::warn!("avatar upload failed: {e}");
                        crate::util::dialog::alert("Gagal upload foto profil");
                    }
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = ev;
        }
    };

    let on_change_password = move |_| {
        let value = password.get();
        if let Err(message) = validate_password(&value) {
            password_message.set(Some(message.to_owned()));
            return;
        }
        busy.set(true);
        let client = client.get_value();
        run(async move {
            match client.update_password(&value).await {
                Ok(()) => {
                    password.set(String::new());
                    show_password_form.set(false);
                    flash(password_message, PASSWORD_CHANGED);
                }
                Err(e) => {
                    leptos::logging::warn!("password change failed: {e}");
                    flash(password_message, PASSWORD_FAILED);
                }
            }
            busy.set(false);
        });
    };

    view! {
        <div class="settings-page">
            <h1>"Pengaturan Akun"</h1>
            <Show when=move || profile_message.get().is_some()>
                <p class="settings-message">{move || profile_message.get().unwrap_or_default()}</p>
            </Show>
            <section class="settings-avatar">
                <img class="avatar avatar--large" src=avatar alt="Foto profil"/>
                <label class="button">
                    "Ganti Foto"
                    <input type="file" accept="image/*" hidden disabled=move || busy.get() on:change=on_avatar/>
                </label>
            </section>
            <section class="settings-fields">
                <label>
                    "Username"
                    <input
                        type="text"
                        prop:value=move || display_name.get()
                        on:input=move |ev| display_name.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Nomor HP"
                    <input
                        type="tel"
                        prop:value=move || phone.get()
                        on:input=move |ev| phone.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Email"
                    <input type="email" disabled prop:value=email/>
                </label>
                <button class="button button--primary" on:click=on_save_profile disabled=move || busy.get()>
                    {move || if busy.get() { "Menyimpan..." } else { "Simpan Perubahan" }}
                </button>
            </section>
            <section class="settings-password">
                <button on:click=move |_| show_password_form.update(|v| *v = !*v)>
                    {move || if show_password_form.get() { "Batal Ganti Password" } else { "Ganti Password" }}
                </button>
                <Show when=move || show_password_form.get()>
                    <div class="settings-password__form">
                        <input
                            type=move || if show_password.get() { "text" } else { "password" }
                            placeholder="Password baru (min. 6 karakter)"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                        <button type="button" on:click=move |_| show_password.update(|v| *v = !*v)>
                            {move || if show_password.get() { "Sembunyikan" } else { "Lihat" }}
                        </button>
                        <button class="button button--primary" on:click=on_change_password disabled=move || busy.get()>
                            "Simpan Password"
                        </button>
                    </div>
                </Show>
                <Show when=move || password_message.get().is_some()>
                    <p class="settings-message">{move || password_message.get().unwrap_or_default()}</p>
                </Show>
            </section>
        </div>
    }
}
