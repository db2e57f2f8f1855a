use crate::HttpStatusCode;

#[test]
fn given_status_codes_when_classified_then_match_ranges() {
    assert!(HttpStatusCode(204).is_success());
    assert!(HttpStatusCode(302).is_redirect());
    assert!(HttpStatusCode(404).is_client_error());
    assert!(HttpStatusCode(500).is_server_error());
    assert!(!HttpStatusCode(200).is_redirect());
}

#[test]
fn given_transient_codes_when_checked_then_retryable() {
    for code in [408, 429, 502, 503, 504] {
        assert!(HttpStatusCode(code).is_retryable(), "{code} should retry");
    }
    assert!(!HttpStatusCode(404).is_retryable());
    assert!(!HttpStatusCode(500).is_retryable());
}

#[test]
fn given_status_when_displayed_then_prefixed() {
    assert_eq!(HttpStatusCode::from(503).to_string(), "HTTP 503");
}
