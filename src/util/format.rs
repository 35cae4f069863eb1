//! Display formatting shared by the storefront pages.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use crate::net::api::public_object_url;
use crate::net::types::Profile;

/// Public bucket holding template preview images.
pub const TEMPLATE_BUCKET: &str = "templates";
/// Public bucket holding profile pictures.
pub const AVATAR_BUCKET: &str = "avatars";

/// Shown when a template or avatar has no stored image.
pub const PLACEHOLDER_IMAGE: &str = "/assets/template-placeholder.jpg";

/// Digits of a free-form price string as a number (`"Rp 25.000"` -> 25000).
/// Strings without digits, or too long to fit, read as 0.
pub fn price_digits(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Rupiah with `.` thousands separators, e.g. `Rp 1.250.000`.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp {grouped}")
}

/// Normalize a stored price string for display.
pub fn format_price(raw: &str) -> String {
    format_rupiah(price_digits(raw))
}

/// Resolve a stored image reference to something an `<img>` can load.
pub fn image_url(base_url: &str, bucket: &str, path: Option<&str>) -> String {
    match path.map(str::trim) {
        None | Some("") => PLACEHOLDER_IMAGE.to_owned(),
        Some(path) if path.starts_with("http://") || path.starts_with("https://") => path.to_owned(),
        Some(path) => public_object_url(base_url, bucket, path),
    }
}

/// Which flavour of the shop a visitor sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Anonymous browsing; favorites and ordering prompt for login.
    Public,
    User,
}

pub fn view_mode(profile: Option<&Profile>) -> ViewMode {
    match profile {
        Some(_) => ViewMode::User,
        None => ViewMode::Public,
    }
}
