//! Native browser dialogs for destructive admin actions.

/// Ask the user to confirm `message`. Host builds never confirm.
pub fn confirm(message: &str) -> bool {
    #[cfg(feature = "csr")]
    {
        web_sys::window().and_then(|w| w.confirm_with_message(message).ok()).unwrap_or(false)
    }
    #[cfg(not(feature = "csr"))]
    {
        log::debug!("confirm dialog unavailable: {message}");
        false
    }
}

/// Show a blocking notice.
pub fn alert(message: &str) {
    #[cfg(feature = "csr")]
    {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
    #[cfg(not(feature = "csr"))]
    log::debug!("alert dialog unavailable: {message}");
}
