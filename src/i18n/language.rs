//! Language codes: normalization and supported-set construction.
//!
//! Every language value that flows through the crate (cookies, headers,
//! query parameters, backend settings) is reduced to a base code such as
//! `"en"` or `"es"` before it is compared against anything.

use serde::Serialize;
use std::fmt;

/// Code returned when every other signal is missing or malformed.
pub const HARD_FALLBACK_LANGUAGE: &str = "en";

/// A normalized base language code.
///
/// The inner value is always lowercase, trimmed, and free of region,
/// script, or codeset subtags. It can only be built through
/// [`normalize_language`], so holding a `LanguageCode` means the value has
/// already been canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Normalize an arbitrary string into a code.
    ///
    /// Alias for [`normalize_language`].
    pub fn parse(raw: &str) -> Option<LanguageCode> {
        normalize_language(raw)
    }

    /// The literal last-resort code (`"en"`).
    pub fn hard_fallback() -> LanguageCode {
        LanguageCode(HARD_FALLBACK_LANGUAGE.to_string())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Reduce a locale string to its lowercase base subtag.
///
/// The base subtag is everything before the first `.`, `_` or `-`
/// (`"en-US"` → `"en"`, `"ES_es"` → `"es"`, `"pt.UTF-8"` → `"pt"`).
///
/// # Returns
/// * `Some(LanguageCode)` for any input with a non-blank base subtag
/// * `None` for empty or whitespace-only input, or input that starts with a
///   separator
pub fn normalize_language(raw: &str) -> Option<LanguageCode> {
    let lowered = raw.trim().to_lowercase();
    let base = lowered
        .split(['.', '_', '-'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() {
        return None;
    }

    Some(LanguageCode(base.to_string()))
}

/// Build the deduplicated, order-preserving set of supported codes.
///
/// Entries that do not normalize are dropped. When nothing usable remains,
/// the result is the normalized `fallback` alone, or empty if there is no
/// usable fallback either.
pub fn ensure_supported_languages<I, S>(raw: I, fallback: Option<&str>) -> Vec<LanguageCode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut supported: Vec<LanguageCode> = Vec::new();

    for code in raw
        .into_iter()
        .filter_map(|value| normalize_language(value.as_ref()))
    {
        if !supported.contains(&code) {
            supported.push(code);
        }
    }

    if supported.is_empty() {
        if let Some(code) = fallback.and_then(normalize_language) {
            supported.push(code);
        }
    }

    supported
}
