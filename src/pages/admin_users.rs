//! Admin user management (`/admin/users`).
//!
//! The list follows every insert, update, and delete on `profiles` through a
//! realtime channel, so role changes made elsewhere show up without a reload.

#[cfg(test)]
#[path = "admin_users_test.rs"]
mod admin_users_test;

use leptos::prelude::*;

use crate::net::api::{Query, SortOrder, SupabaseClient};
use crate::net::realtime::{self, ChangeEvent, ChannelSpec};
use crate::net::types::{Profile, Role};
use crate::state::users::{UsersState, delete_prompt, role_change_prompt};
use crate::util::dialog;

pub(crate) const PROFILES_CHANNEL: ChannelSpec = ChannelSpec { table: "profiles", event: ChangeEvent::All };

pub(crate) fn profiles_query() -> Query {
    Query::new().select("*").order("created_at", SortOrder::Desc)
}

pub(crate) fn profile_by_id(id: &str) -> Query {
    Query::new().eq("id", id)
}

fn role_badge(role: Role) -> &'static str {
    match role {
        Role::Admin => "badge badge--admin",
        Role::User => "badge",
    }
}

#[component]
pub fn AdminUsersPage() -> impl IntoView {
    let client = StoredValue::new(expect_context::<SupabaseClient>());
    let users = RwSignal::new(UsersState { loading: true, ..UsersState::default() });

    let load = {
        let client = client.get_value();
        async move {
            match client.select::<Profile>("profiles", &profiles_query()).await {
                Ok(rows) => users.update(|u| {
                    u.users = rows;
                    u.loading = false;
                }),
                Err(e) => {
                    leptos::logging::warn!("profiles load failed: {e}");
                    users.update(|u| {
                        u.error = Some("Gagal memuat data pengguna".to_owned());
                        u.loading = false;
                    });
                }
            }
        }
    };
    #[cfg(feature = "csr")]
    leptos::task::spawn_local(load);
    #[cfg(not(feature = "csr"))]
    drop(load);

    let channel = client.with_value(|c| {
        realtime::subscribe::<Profile, _>(c, PROFILES_CHANNEL, move |change| users.update(|u| u.apply_change(change)))
    });
    on_cleanup(move || channel.close());

    let toggle_role = move |id: String| {
        let Some(current) = users.with_untracked(|u| u.users.iter().find(|p| p.id == id).map(|p| p.role)) else {
            return;
        };
        if !dialog::confirm(&role_change_prompt(current)) {
            return;
        }
        let next = current.toggled();
        let client = client.get_value();
        let write = async move {
            match client.update("profiles", &profile_by_id(&id), &serde_json::json!({ "role": next })).await {
                Ok(()) => users.update(|u| u.set_role(&id, next)),
                Err(e) => {
                    leptos::logging::warn!("role change for {id} failed: {e}");
                    dialog::alert("Gagal mengubah peran pengguna.");
                }
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(write);
        #[cfg(not(feature = "csr"))]
        drop(write);
    };

    let delete_user = move |id: String| {
        let email = users.with_untracked(|u| u.users.iter().find(|p| p.id == id).and_then(|p| p.email.clone()));
        if !dialog::confirm(&delete_prompt(email.as_deref())) {
            return;
        }
        let client = client.get_value();
        let write = async move {
            match client.delete("profiles", &profile_by_id(&id)).await {
                Ok(()) => users.update(|u| u.remove(&id)),
                Err(e) => {
                    leptos::logging::warn!("delete of {id} failed: {e}");
                    dialog::alert("Gagal menghapus pengguna.");
                }
            }
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(write);
        #[cfg(not(feature = "csr"))]
        drop(write);
    };

    view! {
        <div class="admin-users">
            <header>
                <h1>"Manajemen Pengguna"</h1>
                <input
                    class="admin-search"
                    type="search"
                    placeholder="Cari nama, email, atau nomor HP..."
                    prop:value=move || users.with(|u| u.search.clone())
                    on:input=move |ev| users.update(|u| u.search = event_target_value(&ev))
                />
            </header>
            <Show when=move || users.with(|u| u.error.is_some())>
                <p class="admin-error">{move || users.with(|u| u.error.clone().unwrap_or_default())}</p>
            </Show>
            <Show
                when=move || users.with(|u| !u.loading)
                fallback=|| view! { <p>"Memuat pengguna..."</p> }
            >
                <table class="user-table">
                    <thead>
                        <tr>
                            <th>"Nama"</th>
                            <th>"Email"</th>
                            <th>"No. HP"</th>
                            <th>"Peran"</th>
                            <th>"Aksi"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || users.with(|u| u.filtered().into_iter().cloned().collect::<Vec<_>>())
                            key=|user| (user.id.clone(), user.role, user.display_name.clone())
                            children=move |user: Profile| {
                                let toggle_id = user.id.clone();
                                let delete_id = user.id.clone();
                                view! {
                                    <tr>
                                        <td>{user.display_name.clone().unwrap_or_else(|| "-".to_owned())}</td>
                                        <td>{user.email.clone().unwrap_or_else(|| "-".to_owned())}</td>
                                        <td>{user.phone.clone().unwrap_or_else(|| "-".to_owned())}</td>
                                        <td><span class=role_badge(user.role)>{user.role.as_str()}</span></td>
                                        <td class="user-table__actions">
                                            <button on:click=move |_| toggle_role(toggle_id.clone())>
                                                {format!("Jadikan {}", user.role.toggled())}
                                            </button>
                                            <button class="button--danger" on:click=move |_| delete_user(delete_id.clone())>
                                                "Hapus"
                                            </button>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </Show>
        </div>
    }
}
