//! Error type shared by every backend call.
//!
//! ERROR HANDLING
//! ==============
//! Callers in the session core downgrade these to "signed out" / "no
//! profile"; page-level callers render the message. Nothing here is fatal.

/// Failure of a request against the backend service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("expected at most one row, got {0}")]
    MultipleRows(usize),
    #[error("channel join rejected: {0}")]
    ChannelRejected(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("backend client is only available in the browser")]
    Unavailable,
}

impl BackendError {
    /// Build a status error from a response body, preferring the service's own message.
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::Status { status, message: error_message_from_body(body) }
    }

    /// True when the backend rejected the credentials rather than failing to answer.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Pull a human-readable message out of an auth or REST error body.
///
/// Auth endpoints use `error_description`/`msg`, PostgREST uses `message`.
pub(crate) fn error_message_from_body(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_owned();
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map_or_else(|| body.trim().to_owned(), str::to_owned)
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
