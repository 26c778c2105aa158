use std::sync::OnceLock;

use regex::Regex;

/// Parses a trimmed integer field; empty or unparsable input reads as None.
pub fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Extracts the first 4-digit run from a loosely formatted year field.
pub fn parse_year(value: &str) -> Option<i64> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let pattern = YEAR.get_or_init(|| Regex::new(r"\d{4}").expect("year pattern compiles"));

    pattern
        .find(value.trim())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Trims a text field; blank input reads as None.
pub fn clean_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Lowercases and collapses runs of non-alphanumerics into single hyphens.
pub fn generate_slug(text: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let pattern =
        NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern compiles"));

    pattern
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_owned()
}

/// Splits a comma-separated field into trimmed, non-empty parts.
pub fn split_and_clean(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
