//! Language resolution: pick one supported language from competing signals.
//!
//! This is the single precedence algorithm shared by the edge router, the
//! server-side detector and the client context. It is pure and total: the
//! same input always yields the same code, and the result is never empty.

use crate::i18n::language::{ensure_supported_languages, normalize_language, LanguageCode};

/// Signals consumed by [`resolve_language`], highest priority first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageResolutionInput<'a> {
    /// Explicit request: the signaling header or the `lang` query parameter.
    pub requested_language: Option<&'a str>,
    /// Value of the language cookie.
    pub cookie_language: Option<&'a str>,
    /// Accept-Language candidates, already ordered by quality.
    pub header_languages: &'a [LanguageCode],
    /// Languages the site can render. `None` means no list was supplied.
    pub available_languages: Option<&'a [LanguageCode]>,
    pub fallback_language: Option<&'a str>,
    /// Environment-configured default, consulted only by the hard fallback chain.
    pub environment_default: Option<&'a str>,
}

/// Resolve the language for a request.
///
/// Precedence, first normalized and supported match wins:
/// 1. requested language
/// 2. cookie language
/// 3. each Accept-Language candidate in order
/// 4. the fallback, when no available list was given or it is in that list
/// 5. the first supported language
/// 6. hard chain: requested, cookie, first header candidate, environment
///    default, then `"en"`
///
/// A candidate is "supported" when it appears in the supported set built
/// from `available_languages` and `fallback_language`; if that set is empty
/// every normalized candidate is accepted.
pub fn resolve_language(input: &LanguageResolutionInput<'_>) -> LanguageCode {
    let supported = ensure_supported_languages(
        input.available_languages.unwrap_or_default(),
        input.fallback_language,
    );
    let is_supported = |code: &LanguageCode| supported.is_empty() || supported.contains(code);

    let explicit = [input.requested_language, input.cookie_language]
        .into_iter()
        .flatten()
        .filter_map(normalize_language);
    let from_header = input.header_languages.iter().cloned();

    if let Some(code) = explicit.chain(from_header).find(|code| is_supported(code)) {
        return code;
    }

    if let Some(fallback) = input.fallback_language.and_then(normalize_language) {
        let listed = match input.available_languages {
            None => true,
            Some(available) => available.contains(&fallback),
        };
        if listed {
            return fallback;
        }
    }

    if let Some(first) = supported.into_iter().next() {
        return first;
    }

    hard_fallback(input)
}

fn hard_fallback(input: &LanguageResolutionInput<'_>) -> LanguageCode {
    input
        .requested_language
        .and_then(normalize_language)
        .or_else(|| input.cookie_language.and_then(normalize_language))
        .or_else(|| input.header_languages.first().cloned())
        .or_else(|| input.environment_default.and_then(normalize_language))
        .unwrap_or_else(LanguageCode::hard_fallback)
}
