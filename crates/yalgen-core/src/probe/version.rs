//! Version comparison for minimum-version checks

use semver::Version;
use std::cmp::Ordering;

/// Parse version string, handling various formats
///
/// Accepts a leading `v` and pads missing minor/patch components, so
/// date-style versions such as "20120405" parse as "20120405.0.0".
pub fn parse_version(version_str: &str) -> Option<Version> {
    let trimmed = version_str.trim();
    let cleaned = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if let Ok(version) = Version::parse(cleaned) {
        return Some(version);
    }

    let parts: Vec<&str> = cleaned.split('.').collect();
    if parts.is_empty()
        || parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let mut padded = parts.iter().map(|p| p.trim_start_matches('0')).map(|p| {
        if p.is_empty() {
            "0"
        } else {
            p
        }
    });
    let major = padded.next().unwrap_or("0");
    let minor = padded.next().unwrap_or("0");
    let patch = padded.next().unwrap_or("0");
    Version::parse(&format!("{}.{}.{}", major, minor, patch)).ok()
}

/// Compare two versions
///
/// Semver when both sides parse, otherwise dot-separated numeric components,
/// otherwise plain string order.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    if let (Some(l), Some(r)) = (parse_version(left), parse_version(right)) {
        return l.cmp(&r);
    }

    let numeric = |v: &str| -> Option<Vec<u64>> {
        v.trim()
            .trim_start_matches('v')
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect()
    };
    match (numeric(left), numeric(right)) {
        (Some(mut l), Some(mut r)) => {
            let len = l.len().max(r.len());
            l.resize(len, 0);
            r.resize(len, 0);
            l.cmp(&r)
        }
        _ => left.trim().cmp(right.trim()),
    }
}

/// True when `found` is at or above `minimum`
pub fn meets_minimum(found: &str, minimum: &str) -> bool {
    compare_versions(found, minimum) != Ordering::Less
}
