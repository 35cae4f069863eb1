use std::sync::{Arc, Mutex};

use super::*;
use crate::net::types::{AuthEvent, Identity, Role, Session};
use crate::state::session::SessionConfig;

#[test]
fn avatar_path_is_keyed_by_user() {
    assert_eq!(avatar_path("u-1", "me.jpg"), "avatars/u-1-me.jpg");
}

#[test]
fn password_needs_six_characters() {
    assert_eq!(validate_password("12345"), Err(PASSWORD_TOO_SHORT));
    assert_eq!(validate_password("123456"), Ok(()));
    assert_eq!(validate_password("rahasiaku"), Ok(()));
}

#[test]
fn profile_update_trims_and_skips_blank_phone() {
    let update = profile_update("  Sari  ", "   ");
    assert_eq!(update.display_name.as_deref(), Some("Sari"));
    assert_eq!(update.phone, None);
    assert_eq!(update.avatar_url, None);

    let update = profile_update("Sari", " 0812 ");
    assert_eq!(update.phone.as_deref(), Some("0812"));
}

fn client() -> SupabaseClient {
    SupabaseClient::new(&crate::config::AppConfig {
        supabase_url: "https://demo.supabase.co".to_owned(),
        supabase_anon_key: "anon".to_owned(),
        admin_whatsapp: "6281234567890".to_owned(),
        session: SessionConfig::default(),
    })
}

fn profile(name: &str) -> Profile {
    Profile {
        id: "u-1".to_owned(),
        display_name: Some(name.to_owned()),
        email: None,
        role: Role::Admin,
        avatar_url: None,
        phone: None,
        created_at: None,
    }
}

fn signed_in_store() -> SessionStore {
    let store = SessionStore::new(SessionConfig::default());
    let session = Session {
        access_token: "jwt".to_owned(),
        refresh_token: None,
        expires_at: None,
        expires_in: None,
        user: Identity { id: "u-1".to_owned(), email: None, user_metadata: serde_json::Map::new() },
    };
    store.on_auth_state_change(AuthEvent::SignedIn, Some(&session));
    assert!(store.set_profile(profile("Lama")));
    store
}

#[test]
fn write_profile_mirrors_edit_then_restores_it_on_failure() {
    let store = signed_in_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    store.subscribe(move |state| {
        let name = state.profile().loaded().and_then(|p| p.display_name.clone());
        record.lock().unwrap().push(name);
    });

    let result = futures::executor::block_on(write_profile(&client(), &store, profile("Lama"), profile_update("Baru", "")));

    assert_eq!(result, Err(BackendError::Unavailable));
    assert_eq!(*seen.lock().unwrap(), vec![Some("Baru".to_owned()), Some("Lama".to_owned())]);
    assert_eq!(store.snapshot().profile().loaded(), Some(&profile("Lama")));
}

#[test]
fn write_profile_without_matching_identity_leaves_store_alone() {
    let store = SessionStore::new(SessionConfig::default());
    let result = futures::executor::block_on(write_profile(&client(), &store, profile("Lama"), profile_update("Baru", "")));
    assert_eq!(result, Err(BackendError::Unavailable));
    assert_eq!(store.snapshot(), SessionState::loading());
}
