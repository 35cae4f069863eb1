use super::*;

#[test]
fn error_message_prefers_error_description() {
    let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
    assert_eq!(error_message_from_body(body), "Invalid login credentials");
}

#[test]
fn error_message_reads_postgrest_message() {
    let body = r#"{"code":"23505","message":"duplicate key value"}"#;
    assert_eq!(error_message_from_body(body), "duplicate key value");
}

#[test]
fn error_message_falls_back_to_raw_body() {
    assert_eq!(error_message_from_body("  gateway timeout \n"), "gateway timeout");
    assert_eq!(error_message_from_body(r#"{"code":1}"#), r#"{"code":1}"#);
}

#[test]
fn from_status_formats_display() {
    let err = BackendError::from_status(400, r#"{"msg":"Password should be at least 6 characters"}"#);
    assert_eq!(err.to_string(), "request failed (400): Password should be at least 6 characters");
}

#[test]
fn unauthorized_covers_401_and_403_only() {
    assert!(BackendError::from_status(401, "").is_unauthorized());
    assert!(BackendError::from_status(403, "").is_unauthorized());
    assert!(!BackendError::from_status(500, "").is_unauthorized());
    assert!(!BackendError::Network("offline".to_owned()).is_unauthorized());
}
