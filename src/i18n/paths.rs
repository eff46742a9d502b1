//! Locale-prefixed URL helpers shared by the edge router, the server
//! detector and the client context.
//!
//! URL shape: `/{locale}/{rest}` for non-default languages, `/{rest}` for the
//! default language.

use crate::i18n::language::{normalize_language, LanguageCode};
use regex::Regex;
use std::sync::OnceLock;
use url::form_urlencoded;

/// Query parameter carrying the language after an internal rewrite.
pub const LANG_QUERY_PARAM: &str = "lang";

static LOCALE_SEGMENT: OnceLock<Regex> = OnceLock::new();

fn locale_segment_pattern() -> &'static Regex {
    LOCALE_SEGMENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,3}(?:[-_][A-Za-z0-9]{2,8})?$")
            .expect("locale segment pattern should compile")
    })
}

/// A leading path segment that looks like a locale (`/es/...`, `/en-US`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSegment<'a> {
    /// The segment exactly as it appeared in the path.
    pub raw: &'a str,
    pub code: LanguageCode,
    /// The remaining path, always starting with `/`.
    pub rest: &'a str,
}

/// Detect a locale-shaped first segment.
///
/// Only the shape is checked here; whether the code is actually served is up
/// to the caller.
pub fn split_locale_segment(path: &str) -> Option<LocaleSegment<'_>> {
    let trimmed = path.strip_prefix('/')?;
    let (raw, rest) = match trimmed.find('/') {
        Some(index) => (&trimmed[..index], &trimmed[index..]),
        None => (trimmed, "/"),
    };

    if !locale_segment_pattern().is_match(raw) {
        return None;
    }

    Some(LocaleSegment {
        raw,
        code: normalize_language(raw)?,
        rest,
    })
}

/// Remove a leading locale segment if it names an available language.
pub fn strip_locale_prefix<'a>(path: &'a str, available: &[LanguageCode]) -> &'a str {
    match split_locale_segment(path) {
        Some(segment) if available.contains(&segment.code) => segment.rest,
        _ => path,
    }
}

/// The path prefix for a language: empty for the default, `/{code}` otherwise.
pub fn language_prefix(language: &LanguageCode, default: Option<&LanguageCode>) -> String {
    if default == Some(language) {
        String::new()
    } else {
        format!("/{}", language)
    }
}

/// Prefix an unprefixed path for `language`.
///
/// Never produces `//` or an empty path: `/` becomes `/es` for a
/// non-default language and stays `/` for the default. Leading slashes and
/// backslashes collapse, so the result is always a same-origin path.
pub fn localized_path(language: &LanguageCode, default: Option<&LanguageCode>, path: &str) -> String {
    let prefix = language_prefix(language, default);
    let path = path.trim_start_matches(['/', '\\']);

    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", path),
        (false, true) => prefix,
        (false, false) => format!("{}/{}", prefix, path),
    }
}

/// Drop every `lang` pair from a query string, keeping the rest in order.
///
/// Returns `None` when nothing is left.
pub fn query_without_lang(query: Option<&str>) -> Option<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut kept = 0;

    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if key != LANG_QUERY_PARAM {
            serializer.append_pair(&key, &value);
            kept += 1;
        }
    }

    (kept > 0).then(|| serializer.finish())
}

/// Replace any `lang` pair in a query string with `lang={language}`.
pub fn query_with_lang(query: Option<&str>, language: &LanguageCode) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(rest) = query_without_lang(query) {
        serializer.extend_pairs(form_urlencoded::parse(rest.as_bytes()));
    }
    serializer.append_pair(LANG_QUERY_PARAM, language.as_str());
    serializer.finish()
}

/// Read the `lang` query parameter, if present and non-blank.
pub fn lang_query_value(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .find(|(key, value)| key == LANG_QUERY_PARAM && !value.trim().is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Join a path and an optional query string.
pub fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}
