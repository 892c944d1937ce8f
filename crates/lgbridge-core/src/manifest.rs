//! Lenient scraper for the Bridge settings manifest.
//!
//! This is not a JSON parser. It pulls the first `install_locations` array
//! out of the document, splits it into brace-delimited objects and reads
//! the `version` and `path` string fields from each one. Unknown fields
//! are ignored, malformed objects are skipped and the rest of the document
//! is never validated. Objects must not contain nested braces.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::settings;

static INSTALL_LOCATIONS: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r#"(?s)"{}":\s*\[(.*?)\]"#,
        regex::escape(settings::INSTALL_LOCATIONS_KEY)
    );
    Regex::new(&pattern).expect("valid install_locations pattern")
});

static OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{(.*?)\}").expect("valid object pattern"));

static VERSION_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""version":\s*"(.*?)""#).expect("valid version pattern"));

static PATH_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""path":\s*"(.*?)""#).expect("valid path pattern"));

/// One installed Bridge copy listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub version: String,
    /// Install directory, unescaped.
    pub path: String,
}

/// Scrape every usable entry from the `install_locations` array.
///
/// Entries come back in document order. Duplicates are kept; callers that
/// build a version map let the later entry win.
pub fn scrape_install_locations(text: &str) -> Vec<VersionEntry> {
    let Some(array) = INSTALL_LOCATIONS.captures(text).and_then(|c| c.get(1)) else {
        tracing::debug!("Manifest has no install_locations array");
        return Vec::new();
    };

    OBJECT
        .find_iter(array.as_str())
        .filter_map(|object| parse_entry(object.as_str()))
        .collect()
}

fn parse_entry(object: &str) -> Option<VersionEntry> {
    let version = capture(&VERSION_FIELD, object);
    let path = capture(&PATH_FIELD, object);

    match (version, path) {
        (Some(version), Some(path)) if !version.trim().is_empty() && !path.trim().is_empty() => {
            Some(VersionEntry {
                version: version.to_string(),
                path: unescape(path),
            })
        }
        _ => {
            tracing::warn!(entry = object, "Skipping malformed install location");
            None
        }
    }
}

fn capture<'a>(pattern: &Regex, haystack: &'a str) -> Option<&'a str> {
    pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Resolve backslash escapes in a manifest string value.
///
/// Handles the JSON escapes, the control escapes `\a`, `\e` and `\v`,
/// `\xHH`, `\uXXXX` and up to three octal digits. An unknown or malformed
/// escape yields the escaped character itself and a trailing lone backslash
/// is kept.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{000C}'),
            Some('b') => out.push('\u{0008}'),
            Some('a') => out.push('\u{0007}'),
            Some('e') => out.push('\u{001B}'),
            Some('v') => out.push('\u{000B}'),
            Some('x') => push_hex(&mut out, &mut chars, 'x', 2),
            Some('u') => push_hex(&mut out, &mut chars, 'u', 4),
            Some(digit @ '0'..='7') => {
                let mut code = digit.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.clone().next().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from((code & 0xFF) as u8));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Decode exactly `digits` hex digits, or push `escape` literally.
fn push_hex(out: &mut String, chars: &mut std::str::Chars<'_>, escape: char, digits: usize) {
    let hex: String = chars.clone().take(digits).collect();
    let code = u32::from_str_radix(&hex, 16)
        .ok()
        .filter(|_| hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()));

    match code {
        Some(code) => {
            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            for _ in 0..digits {
                chars.next();
            }
        }
        None => out.push(escape),
    }
}
