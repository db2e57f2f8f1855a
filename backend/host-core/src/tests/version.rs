// Unit tests for release version comparison.

use crate::update::{is_newer, parse_version};

#[test]
fn given_prefixed_and_suffixed_versions_when_parsed_then_core_triple_extracted() {
    assert_eq!(parse_version("1.2.3"), Some((1, 2, 3)));
    assert_eq!(parse_version("v10.0.7"), Some((10, 0, 7)));
    assert_eq!(parse_version("2.0.0-beta.1"), Some((2, 0, 0)));
    assert_eq!(parse_version("release"), None);
    assert_eq!(parse_version("1.2"), None);
}

/// **VALUE**: Comparison is numeric per component, not lexical.
///
/// **BUG THIS CATCHES**: Would catch a string comparison that ranks
/// "1.10.0" below "1.9.0" and hides a real update.
#[test]
fn given_multi_digit_components_when_compared_then_numeric_order_used() {
    assert!(is_newer("1.10.0", "1.9.0"));
    assert!(is_newer("2.0.0", "1.99.99"));
    assert!(!is_newer("1.0.0", "1.0.0"));
    assert!(!is_newer("0.9.9", "1.0.0"));
}

#[test]
fn given_unparseable_version_when_compared_then_never_newer() {
    assert!(!is_newer("latest", "1.0.0"));
    assert!(!is_newer("2.0.0", "dev"));
}
