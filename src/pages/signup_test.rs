use super::*;

#[test]
fn validate_signup_requires_email_and_six_char_password() {
    let err = Err("Email dan password wajib diisi (min. 6 karakter).");
    assert_eq!(validate_signup("", "rahasia", "sari", "0812"), err);
    assert_eq!(validate_signup("sari@ciptain.id", "12345", "sari", "0812"), err);

    let input = validate_signup(" sari@ciptain.id ", "123456", " sari ", " 0812 ").unwrap();
    assert_eq!(input.email, "sari@ciptain.id");
    assert_eq!(input.password, "123456");
    assert_eq!(input.username, "sari");
    assert_eq!(input.phone, "0812");
}

#[test]
fn metadata_carries_username_and_phone() {
    let input = validate_signup("a@b.id", "123456", "budi", "08123456789").unwrap();
    let metadata = input.metadata();
    assert_eq!(metadata.get("username").and_then(|v| v.as_str()), Some("budi"));
    assert_eq!(metadata.get("phone").and_then(|v| v.as_str()), Some("08123456789"));
    assert_eq!(metadata.len(), 2);
}

#[test]
fn confirmation_redirect_points_at_login() {
    assert_eq!(confirmation_redirect("https://ciptain.id"), "https://ciptain.id/login");
    assert_eq!(confirmation_redirect("http://localhost:8080/"), "http://localhost:8080/login");
}
