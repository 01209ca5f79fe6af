use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("version pattern is valid")
    })
}

/// Coerces a loosely formatted version string into a plain `major.minor.patch`
/// semver value. Range sigils ("^3.6.0"), prefixes ("v1.2"), build metadata and
/// pre-release tags are all stripped; missing minor/patch components are padded
/// with zeros. Returns `None` when the string contains no digits at all.
///
/// Examples: `"^2.1"` -> `2.1.0`, `"3.0.0-pr1"` -> `3.0.0`, `"CL 270241"` ->
/// `270241.0.0`.
pub fn coerce(input: &str) -> Option<Version> {
    let caps = version_pattern().captures(input)?;
    let component = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    let major = caps.get(1)?.as_str().parse::<u64>().ok()?;
    Some(Version::new(major, component(2), component(3)))
}

/// True when both strings coerce to the same normalized version.
/// Uncoercible input never matches anything, itself included.
pub fn coerced_eq(a: &str, b: &str) -> bool {
    match (coerce(a), coerce(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// True when `version` coerces to a value at or above `floor`.
pub fn meets_floor(version: &str, floor: &Version) -> bool {
    coerce(version).is_some_and(|v| v >= *floor)
}

/// True when `version` coerces to a value at or above the coercion of
/// `minimum`. False when either side fails to coerce.
pub fn at_least(version: &str, minimum: &str) -> bool {
    match (coerce(version), coerce(minimum)) {
        (Some(v), Some(min)) => v >= min,
        _ => false,
    }
}
