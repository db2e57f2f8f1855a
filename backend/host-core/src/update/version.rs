use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

const VERSION_PATTERN: &str = r"^v?(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";

static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn version_regex() -> &'static Regex {
    VERSION_REGEX.get_or_init(|| Regex::new(VERSION_PATTERN).expect("valid regex pattern"))
}

/// `major.minor.patch` of a version string such as `1.4.2`, `v2.0.0` or
/// `1.4.2-beta.1` (pre-release and build suffixes are ignored).
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let caps = version_regex().captures(version.trim())?;
    let part = |name: &str| caps.name(name)?.as_str().parse::<u64>().ok();
    Some((part("major")?, part("minor")?, part("patch")?))
}

/// Whether `candidate` is strictly newer than `current`. Unparseable
/// versions are never newer.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(candidate), Some(current)) => candidate.cmp(&current) == Ordering::Greater,
        _ => false,
    }
}
