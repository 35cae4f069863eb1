use super::*;
use crate::net::types::Role;

#[test]
fn price_digits_strips_everything_but_digits() {
    assert_eq!(price_digits("Rp 25.000"), 25_000);
    assert_eq!(price_digits("150000"), 150_000);
    assert_eq!(price_digits("Gratis"), 0);
    assert_eq!(price_digits(""), 0);
}

#[test]
fn format_rupiah_groups_thousands() {
    assert_eq!(format_rupiah(0), "Rp 0");
    assert_eq!(format_rupiah(999), "Rp 999");
    assert_eq!(format_rupiah(25_000), "Rp 25.000");
    assert_eq!(format_rupiah(1_250_000), "Rp 1.250.000");
}

#[test]
fn format_price_normalizes_stored_strings() {
    assert_eq!(format_price("Rp25000"), "Rp 25.000");
    assert_eq!(format_price("gratis"), "Rp 0");
}

#[test]
fn image_url_resolves_storage_paths() {
    let base = "https://abc.supabase.co";
    assert_eq!(image_url(base, "templates", None), PLACEHOLDER_IMAGE);
    assert_eq!(image_url(base, "templates", Some("  ")), PLACEHOLDER_IMAGE);
    assert_eq!(image_url(base, "templates", Some("https://cdn.example/x.png")), "https://cdn.example/x.png");
    assert_eq!(
        image_url(base, "templates", Some("wedding/a.png")),
        "https://abc.supabase.co/storage/v1/object/public/templates/wedding/a.png"
    );
}

#[test]
fn view_mode_follows_profile_presence() {
    assert_eq!(view_mode(None), ViewMode::Public);
    let profile = Profile {
        id: "u-1".to_owned(),
        display_name: None,
        email: None,
        role: Role::Admin,
        avatar_url: None,
        phone: None,
        created_at: None,
    };
    assert_eq!(view_mode(Some(&profile)), ViewMode::User);
}
