//! Length-bounded, collision-resistant name construction.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Maximum length of a target-cluster name or label value (DNS label limit).
pub const MAX_NAME_LEN: usize = 63;

/// Hex characters of the fingerprint spliced into truncated components.
const FINGERPRINT_LEN: usize = 6;

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static pattern"));

/// True if `value` can be used as-is as a target-cluster identifier:
/// non-empty, at most [`MAX_NAME_LEN`] bytes, lowercase alphanumerics and
/// inner hyphens only.
pub fn is_valid_dns_label(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_NAME_LEN && DNS_LABEL.is_match(value)
}

/// Returns the mirrored name of an upstream resource in a given backend.
/// Short names pass through unchanged; over-length names are shortened.
pub fn build_name(backend_name: &str, upstream_name: &str) -> String {
    hashname(MAX_NAME_LEN, &[backend_name, upstream_name])
}

/// Bounds a label value to the target-cluster limit, shortening if needed.
pub fn shorten_label_value(value: &str) -> String {
    hashname(MAX_NAME_LEN, &[value])
}

/// Bounded join of arbitrary name components (used for port names).
pub fn bounded_join(parts: &[&str]) -> String {
    hashname(MAX_NAME_LEN, parts)
}

/// Joins `parts` with `-` and guarantees the result is at most `limit`
/// bytes. A join that already fits is returned unchanged. An over-length
/// join is shortened by replacing components, last first, with a truncated
/// prefix carrying a fingerprint of the original join; each component is
/// allotted an equal share of the budget. If every component has been
/// truncated and the join still does not fit, the fingerprint digest alone
/// fills the available length.
fn hashname(limit: usize, parts: &[&str]) -> String {
    let joined = parts.join("-");
    if joined.len() <= limit {
        return joined;
    }

    let digest = format!("{:x}", Sha256::digest(joined.as_bytes()));
    let fingerprint = &digest[..FINGERPRINT_LEN];
    let budget = limit / parts.len().max(1);

    let mut shortened: Vec<String> = parts.iter().map(|p| (*p).to_string()).collect();
    for i in (0..shortened.len()).rev() {
        shortened[i] = truncate(budget, &shortened[i], fingerprint);
        let rejoined = shortened.join("-");
        if rejoined.len() <= limit {
            return rejoined;
        }
    }

    let end = digest.len().min(limit);
    digest[..end].to_string()
}

/// Truncates `s` to `limit` bytes by replacing its tail with `suffix`.
fn truncate(limit: usize, s: &str, suffix: &str) -> String {
    if limit >= s.len() {
        return s.to_string();
    }
    if limit <= suffix.len() {
        return prefix(suffix, limit).to_string();
    }
    let mut out = prefix(s, limit - suffix.len()).to_string();
    out.push_str(suffix);
    out
}

/// Longest prefix of `s` that is at most `end` bytes and ends on a char
/// boundary. Validated names are ASCII; this keeps arbitrary label values
/// from splitting a multi-byte character.
fn prefix(s: &str, end: usize) -> &str {
    let mut end = end.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_short_names_pass_through() {
        assert_eq!(build_name("cluster1", "service1"), "cluster1-service1");
    }

    #[test]
    fn test_exact_limit_unchanged() {
        // 31 + 1 + 31 = 63: right at the limit, no shortening.
        let part = "name-that-is-exactly-at-d-limit";
        assert_eq!(part.len(), 31);
        let joined = format!("{part}-{part}");
        assert_eq!(joined.len(), MAX_NAME_LEN);
        assert_eq!(build_name(part, part), joined);
    }

    #[test]
    fn test_long_names_bounded() {
        let long = "the-really-long-upstream-service-name-that-is-way-over-the-character-limit";
        let shortened = build_name("cluster1", long);
        assert!(shortened.len() <= MAX_NAME_LEN);
        // The untouched leading component survives.
        assert!(shortened.starts_with("cluster1-"));
    }

    #[test]
    fn test_both_components_truncated() {
        let backend = "a-really-long-cluster-name-that-does-not-really-make-sense-at-all";
        let upstream = "the-really-long-upstream-service-name-that-is-over-the-limit";
        let shortened = build_name(backend, upstream);
        assert!(shortened.len() <= MAX_NAME_LEN);
        // Equal budget per component: both sides were shortened.
        assert!(!shortened.contains(backend));
        assert!(!shortened.contains(upstream));
    }

    #[test]
    fn test_deterministic() {
        let backend = "b".repeat(20);
        let upstream = "s".repeat(100);
        let first = build_name(&backend, &upstream);
        let second = build_name(&backend, &upstream);
        assert_eq!(first, second);
        assert!(first.len() <= MAX_NAME_LEN);
    }

    #[test]
    fn test_distinct_inputs_distinct_outputs() {
        // Differential sampling: over-length inputs differing only in a
        // short prefix must still map to distinct names.
        let mut seen = HashSet::new();
        let tail = "x".repeat(80);
        for i in 0..1000 {
            let name = build_name("cluster1", &format!("svc-{i}-{tail}"));
            assert!(name.len() <= MAX_NAME_LEN);
            assert!(seen.insert(name), "collision at input {i}");
        }
    }

    #[test]
    fn test_pathological_component_count_falls_back_to_digest() {
        let parts: Vec<String> = (0..40).map(|i| format!("part{i:02}xxxx")).collect();
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let out = bounded_join(&refs);
        assert_eq!(out.len(), MAX_NAME_LEN);
        // Digest fallback is pure hex.
        assert!(out.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_shorten_label_value() {
        assert_eq!(shorten_label_value("small"), "small");
        let long = "y".repeat(200);
        let out = shorten_label_value(&long);
        assert!(out.len() <= MAX_NAME_LEN);
        assert_eq!(out, shorten_label_value(&long));
    }

    #[test]
    fn test_multibyte_truncation_is_safe() {
        let long = "é".repeat(100);
        let out = shorten_label_value(&long);
        assert!(out.len() <= MAX_NAME_LEN);
    }

    #[test]
    fn test_dns_label_rules() {
        let cases = [
            ("", false),
            ("mycluster", true),
            ("my-cluster", true),
            ("my_cluster", false),
            ("my----cluster", true),
            ("-mycluster", false),
            ("mycluster-", false),
            ("!@!mycl^%$uster**", false),
            ("!@!my-cl^%$ust_er**", false),
            ("  my cluster  ", false),
        ];
        for (input, expected) in cases {
            assert_eq!(is_valid_dns_label(input), expected, "input: {input:?}");
        }
        assert!(!is_valid_dns_label(&"a".repeat(MAX_NAME_LEN + 1)));
        assert!(is_valid_dns_label(&"a".repeat(MAX_NAME_LEN)));
    }
}
