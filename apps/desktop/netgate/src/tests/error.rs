// Unit tests for error module

use crate::error::NetgateError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Startup errors serialize with their variant tag.
///
/// **BUG THIS CATCHES**: Would catch if the `tag`/`content` attributes are
/// dropped and the variant name disappears from the JSON.
#[test]
fn given_host_error_when_serialized_then_contains_type_and_message() {
    // GIVEN: A Host error
    let err = NetgateError::Host {
        message: String::from("Invalid poll interval"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(&err).unwrap();

    // THEN: Tagged by variant, message under data
    assert_eq!(json["type"], "Host");
    assert_eq!(json["data"]["message"], "Invalid poll interval");
    assert!(json["data"]["location"]["line"].as_u64().unwrap() > 0);
}

#[test]
fn given_netgate_error_when_displayed_then_includes_location() {
    let err = NetgateError::Netgate {
        message: String::from("boom"),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Netgate Error: boom"));
    assert!(text.contains("error.rs"), "location should point at this file: {text}");
}
