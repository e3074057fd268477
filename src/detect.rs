//! Single-value type detectors.
//!
//! Each detector answers whether one non-empty cell looks like a given
//! warehouse type. Values are trimmed before matching. Date and timestamp
//! detection checks the textual layout only; calendar validity is left to the
//! warehouse load.

use std::sync::OnceLock;

use regex::Regex;

use crate::schema::TypeTag;

const BOOL_TOKENS: &[&str] = &["true", "false", "yes", "no", "1", "0"];

fn timestamp_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile_all(&[
            r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?$",
            r"^[0-9]{4}/[0-9]{2}/[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?$",
        ])
    })
}

fn date_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile_all(&[r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$", r"^[0-9]{4}/[0-9]{2}/[0-9]{2}$"])
    })
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .unwrap_or_else(|err| panic!("invalid decimal pattern: {err}"))
    })
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).unwrap_or_else(|err| panic!("invalid pattern {pattern}: {err}"))
        })
        .collect()
}

/// `true`, `false`, `yes`, `no`, `1` or `0`, in any letter case.
pub fn is_bool(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    BOOL_TOKENS.contains(&lowered.as_str())
}

/// Canonical base-10 integer that fits in `i64`.
///
/// Zero-padded values such as `00123` are rejected so that codes keep their
/// padding as strings; `0` itself is accepted.
pub fn is_int64(value: &str) -> bool {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }
    trimmed.parse::<i64>().is_ok()
}

/// Plain or scientific-notation decimal literal (`123`, `123.45`, `1e10`, `.5`).
pub fn is_exact_decimal(value: &str) -> bool {
    decimal_pattern().is_match(value.trim())
}

/// Classifies a value as [`TypeTag::Timestamp`], [`TypeTag::Date`], or neither.
pub fn detect_date_or_timestamp(value: &str) -> Option<TypeTag> {
    let trimmed = value.trim();
    if timestamp_patterns().iter().any(|re| re.is_match(trimmed)) {
        return Some(TypeTag::Timestamp);
    }
    if date_patterns().iter().any(|re| re.is_match(trimmed)) {
        return Some(TypeTag::Date);
    }
    None
}
