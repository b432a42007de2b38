//! Response normalization
//!
//! Stateless, infallible helpers that repair catalog responses after decoding.
//! None of them can fail a request: on any parse problem the input is kept
//! as-is or the derived field stays at its zero value.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Update reasons the catalog appends to updated-entry titles
pub const UPDATE_REASONS: &[&str] = &["new model added", "spec updated"];

static VERSION_RE: Lazy<Regex> = Lazy::new(|| literal_regex(r"Version (\d+)"));
static VERSION_TS_RE: Lazy<Regex> = Lazy::new(|| literal_regex(r" (\w{3}\.\d{1,2}, \d{4})"));

fn literal_regex(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("FATAL: invalid built-in pattern {pattern:?}: {e}"))
}

/// Format of the version timestamp embedded in the version title, e.g. `Jan.2, 2024`
const VERSION_TS_FORMAT: &str = "%b.%d, %Y";

/// Replace Windows-style path separators with forward slashes
pub fn normalize_url(s: &str) -> String {
    s.replace('\\', "/")
}

/// In-place variant of [`normalize_url`]
pub fn normalize_url_in_place(s: &mut String) {
    if s.contains('\\') {
        *s = normalize_url(s);
    }
}

/// Decode a double-encoded image URL
///
/// Only strings starting with `http%` are decoded. Malformed escapes or a
/// result that is not UTF-8 leave the input unchanged.
pub fn unescape_image(s: &str) -> String {
    if !s.starts_with("http%") || !has_valid_escapes(s) {
        return s.to_string();
    }
    match percent_encoding::percent_decode_str(s).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s.to_string(),
    }
}

/// Every `%` must be followed by two hex digits
fn has_valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Structured data extracted from a change-feed version title
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionInfo {
    /// Title with the bold wrapper and surrounding whitespace removed
    pub title: String,
    /// Numeric version, 0 if absent
    pub version: u64,
    /// Publication date, if present and valid
    pub timestamp: Option<NaiveDate>,
}

/// Parse a version title such as `<b>Version 593 released Jan.2, 2024</b>`
pub fn parse_version_title(raw: &str) -> VersionInfo {
    let title = raw.strip_prefix("<b>").unwrap_or(raw);
    let title = title.strip_suffix("</b>").unwrap_or(title).trim();

    let version = VERSION_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0);

    let timestamp = VERSION_TS_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), VERSION_TS_FORMAT).ok());

    VersionInfo {
        title: title.to_string(),
        version,
        timestamp,
    }
}

/// Split a recognized `(reason)` suffix off an updated-entry title
///
/// Returns the title unchanged and `None` unless the trailing parenthetical
/// is one of [`UPDATE_REASONS`].
pub fn split_update_reason(title: &str) -> (String, Option<String>) {
    let Some(inner) = title.strip_suffix(')') else {
        return (title.to_string(), None);
    };
    match inner.rfind('(') {
        Some(open) if open > 0 => {
            let reason = &inner[open + 1..];
            if UPDATE_REASONS.contains(&reason) {
                (inner[..open].trim().to_string(), Some(reason.to_string()))
            } else {
                (title.to_string(), None)
            }
        }
        _ => (title.to_string(), None),
    }
}
