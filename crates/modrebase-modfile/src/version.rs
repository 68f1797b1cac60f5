//! Go module version precedence.
//!
//! Module versions carry a leading `v` and may use the `v1` / `v1.2`
//! shorthands. Precedence follows semantic versioning: build metadata is
//! ignored, a pre-release sorts before its release, and anything that does
//! not parse sorts below every valid version (invalid versions compare equal
//! to each other).

use semver::Version;
use std::cmp::Ordering;

fn parse(v: &str) -> Option<(Version, bool)> {
    let rest = v.strip_prefix('v')?;
    let (core, suffix) = match rest.find(['-', '+']) {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let full = match core.matches('.').count() {
        0 if suffix.is_empty() => format!("{core}.0.0"),
        1 if suffix.is_empty() => format!("{core}.0"),
        2 => format!("{core}{suffix}"),
        _ => return None,
    };
    let shorthand = core.matches('.').count() < 2;
    Version::parse(&full).ok().map(|parsed| (parsed, shorthand))
}

/// Whether `v` is a valid Go semantic version (shorthands included).
pub fn is_valid(v: &str) -> bool {
    parse(v).is_some()
}

/// Whether `v` is written in the full form a `go.mod` line requires:
/// `vMAJOR.MINOR.PATCH[-pre]`, with `+incompatible` as the only build suffix.
pub fn is_canonical(v: &str) -> bool {
    match parse(v) {
        Some((parsed, false)) => {
            parsed.build.is_empty() || parsed.build.as_str() == "incompatible"
        }
        _ => false,
    }
}

/// Compare two module versions by precedence.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some((a, _)), Some((b, _))) => a.cmp_precedence(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// The higher of two versions. Ties keep `preferred`.
pub fn max<'a>(preferred: &'a str, other: &'a str) -> &'a str {
    if compare(other, preferred) == Ordering::Greater {
        other
    } else {
        preferred
    }
}

/// Whether `v` is a valid `go` directive version (`1.21`, `1.21.3`, `1.21rc1`).
pub fn is_valid_go_version(v: &str) -> bool {
    fn number(s: &str) -> bool {
        !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s == "0" || !s.starts_with('0'))
    }

    let split = v
        .find(|c: char| c.is_ascii_lowercase())
        .unwrap_or(v.len());
    let (numbers, pre) = v.split_at(split);
    if !pre.is_empty() {
        let digits = pre.trim_start_matches(|c: char| c.is_ascii_lowercase());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }

    let parts: Vec<&str> = numbers.split('.').collect();
    if !(2..=3).contains(&parts.len()) || !parts.iter().all(|p| number(p)) {
        return false;
    }
    parts[0] != "0"
}

/// Whether `name` is a valid `toolchain` directive value.
pub fn is_valid_toolchain(name: &str) -> bool {
    name == "default"
        || name
            .strip_prefix("go1")
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
