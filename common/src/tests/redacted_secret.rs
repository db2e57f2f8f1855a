// Unit tests for the credential wrapper.
// Secrets must never show up in logs or on the wire.

use crate::RedactedSecret;

/// **VALUE**: Debug and Display never print the secret.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug sneaking back in, which
/// would put WiFi passphrases into `netgate.log` via `{:?}` formatting.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2");

    // WHEN: Formatting it both ways
    let debug = format!("{secret:?}");
    let display = format!("{secret}");

    // THEN: Neither contains the value
    assert!(!debug.contains("hunter2"));
    assert!(!display.contains("hunter2"));
    assert_eq!(secret.expose(), "hunter2");
}

/// **VALUE**: Serializing a secret fails instead of leaking it into a payload.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2");

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&secret);

    // THEN: Serialization is refused
    assert!(result.is_err(), "RedactedSecret must not serialize");
}

#[test]
fn given_json_string_when_deserialized_then_secret_holds_value() {
    let secret: RedactedSecret = serde_json::from_str("\"pa55\"").unwrap();

    assert_eq!(secret.expose(), "pa55");
    assert_eq!(secret.len(), 4);
    assert!(!secret.is_empty());
}
