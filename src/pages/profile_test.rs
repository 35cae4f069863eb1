use super::*;
use crate::net::types::Role;

fn identity(email: Option<&str>) -> Identity {
    Identity { id: "u-1".to_owned(), email: email.map(str::to_owned), user_metadata: serde_json::Map::new() }
}

fn profile(name: Option<&str>) -> Profile {
    Profile {
        id: "u-1".to_owned(),
        display_name: name.map(str::to_owned),
        email: None,
        role: Role::User,
        avatar_url: None,
        phone: None,
        created_at: None,
    }
}

#[test]
fn greeting_prefers_display_name() {
    assert_eq!(greeting_name(Some(&profile(Some("Sari"))), Some(&identity(Some("x@y.id")))), "Sari");
}

#[test]
fn greeting_falls_back_to_email_local_part() {
    assert_eq!(greeting_name(Some(&profile(Some("  "))), Some(&identity(Some("budi@mail.com")))), "budi");
    assert_eq!(greeting_name(None, Some(&identity(Some("citra@mail.com")))), "citra");
}

#[test]
fn greeting_defaults_when_nothing_is_known() {
    assert_eq!(greeting_name(None, Some(&identity(None))), "Pengguna");
    assert_eq!(greeting_name(None, None), "Pengguna");
}

#[test]
fn own_orders_are_newest_first() {
    let query = own_orders_query("u-1");
    assert!(query.params().contains(&("user_id".to_owned(), "eq.u-1".to_owned())));
    assert!(query.params().contains(&("order".to_owned(), "created_at.desc".to_owned())));
}
