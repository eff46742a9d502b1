//! Server-side language detection for the render layer.
//!
//! The render layer cannot see the edge router's decision directly, so it
//! rebuilds it from the forwarded signals: signaling header (or `lang`
//! query), then cookie, then `Accept-Language`. The precedence itself is
//! [`resolve_language`], the same function the rest of the crate uses.

use crate::i18n::{
    lang_query_value, localized_path, parse_accept_language_header, resolve_language,
    LanguageCode, LanguageResolutionInput,
};
use crate::settings::{LanguageSettings, SettingsProvider};
use crate::signals::{language_from_cookies, language_from_signal};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

/// hreflang value for the language-neutral alternate.
pub const X_DEFAULT_HREFLANG: &str = "x-default";

/// Language snapshot for a single render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageServerContextValue {
    pub language: LanguageCode,
    pub default_language: Option<LanguageCode>,
    pub available_languages: Vec<LanguageCode>,
    pub fallback_language: Option<LanguageCode>,
}

/// An alternate-language link for page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternateLink {
    pub hreflang: String,
    pub href: String,
}

impl LanguageServerContextValue {
    /// Canonical path of `path` (unprefixed) in the resolved language.
    pub fn canonical_path(&self, path: &str) -> String {
        localized_path(&self.language, self.default_language.as_ref(), path)
    }

    /// One alternate per available language, plus `x-default`.
    ///
    /// `x-default` points at the default language, or at the fallback when
    /// no default is configured.
    pub fn alternate_paths(&self, path: &str) -> Vec<AlternateLink> {
        let default = self.default_language.as_ref();
        let mut links: Vec<AlternateLink> = self
            .available_languages
            .iter()
            .map(|code| AlternateLink {
                hreflang: code.to_string(),
                href: localized_path(code, default, path),
            })
            .collect();

        if let Some(neutral) = default.or(self.fallback_language.as_ref()) {
            links.push(AlternateLink {
                hreflang: X_DEFAULT_HREFLANG.to_string(),
                href: localized_path(neutral, default, path),
            });
        }

        links
    }
}

/// Compute the language for a render pass from request signals.
pub fn detect_server_language(
    headers: &HeaderMap,
    query: Option<&str>,
    settings: &LanguageSettings,
    environment_default: &LanguageCode,
) -> LanguageServerContextValue {
    let query_language = lang_query_value(query);
    let requested = language_from_signal(headers).or(query_language.as_deref());
    let cookie = language_from_cookies(headers);
    let header_languages = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(parse_accept_language_header)
        .unwrap_or_default();

    let language = resolve_language(&LanguageResolutionInput {
        requested_language: requested,
        cookie_language: cookie.as_deref(),
        header_languages: &header_languages,
        available_languages: Some(settings.available_languages.as_slice()),
        fallback_language: Some(settings.fallback_language.as_str()),
        environment_default: Some(environment_default.as_str()),
    });

    LanguageServerContextValue {
        language,
        default_language: settings.default_language.clone(),
        available_languages: settings.available_languages.clone(),
        fallback_language: Some(settings.fallback_language.clone()),
    }
}

/// Extractor yielding the render pass's language context.
pub struct ServerLanguage(pub LanguageServerContextValue);

#[async_trait]
impl<S> FromRequestParts<S> for ServerLanguage
where
    S: Send + Sync,
    Arc<dyn SettingsProvider>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider: Arc<dyn SettingsProvider> = FromRef::from_ref(state);
        let settings = provider.language_settings().await;

        Ok(ServerLanguage(detect_server_language(
            &parts.headers,
            parts.uri.query(),
            &settings,
            provider.environment_default(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RawLanguageSettings;
    use crate::signals::LANGUAGE_HEADER;
    use axum::http::HeaderValue;

    fn settings() -> LanguageSettings {
        LanguageSettings::from_raw(
            RawLanguageSettings {
                available_languages: vec!["en".into(), "es".into(), "fr".into()],
                default_language: Some("en".into()),
                fallback_language: None,
            },
            &LanguageCode::hard_fallback(),
        )
    }

    fn detect(headers: &HeaderMap, query: Option<&str>) -> LanguageCode {
        detect_server_language(headers, query, &settings(), &LanguageCode::hard_fallback()).language
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(*value));
        }
        map
    }

    // ==================== Precedence Tests ====================

    #[test]
    fn test_signal_header_wins() {
        let map = headers(&[
            (LANGUAGE_HEADER, "fr"),
            ("cookie", "tourealo-lang=es"),
            ("accept-language", "en"),
        ]);
        assert_eq!(detect(&map, Some("lang=es")), "fr");
    }

    #[test]
    fn test_query_used_without_signal_header() {
        let map = headers(&[("cookie", "tourealo-lang=es")]);
        assert_eq!(detect(&map, Some("lang=fr")), "fr");
    }

    #[test]
    fn test_cookie_over_accept_language() {
        let map = headers(&[("cookie", "tourealo-lang=es"), ("accept-language", "fr;q=0.9")]);
        assert_eq!(detect(&map, None), "es");
    }

    #[test]
    fn test_accept_language_order() {
        let map = headers(&[("accept-language", "de, es;q=0.4, fr;q=0.8")]);
        assert_eq!(detect(&map, None), "fr");
    }

    #[test]
    fn test_nothing_falls_back() {
        assert_eq!(detect(&HeaderMap::new(), None), "en");
    }

    #[test]
    fn test_unsupported_signal_falls_through() {
        let map = headers(&[(LANGUAGE_HEADER, "ja"), ("cookie", "tourealo-lang=es")]);
        assert_eq!(detect(&map, None), "es");
    }

    #[test]
    fn test_context_carries_settings() {
        let context = detect_server_language(
            &HeaderMap::new(),
            None,
            &settings(),
            &LanguageCode::hard_fallback(),
        );
        assert_eq!(context.available_languages, vec!["en", "es", "fr"]);
        assert_eq!(context.default_language.as_ref().unwrap(), "en");
        assert_eq!(context.fallback_language.as_ref().unwrap(), "en");
    }

    // ==================== Metadata Tests ====================

    #[test]
    fn test_canonical_path() {
        let map = headers(&[(LANGUAGE_HEADER, "es")]);
        let context = detect_server_language(&map, None, &settings(), &LanguageCode::hard_fallback());
        assert_eq!(context.canonical_path("/tours"), "/es/tours");
        assert_eq!(context.canonical_path("/"), "/es");
    }

    #[test]
    fn test_canonical_path_default_is_unprefixed() {
        let context = detect_server_language(&HeaderMap::new(), None, &settings(), &LanguageCode::hard_fallback());
        assert_eq!(context.canonical_path("/tours"), "/tours");
    }

    #[test]
    fn test_alternate_paths() {
        let context = detect_server_language(&HeaderMap::new(), None, &settings(), &LanguageCode::hard_fallback());
        let links = context.alternate_paths("/tours");
        let pairs: Vec<(&str, &str)> = links
            .iter()
            .map(|link| (link.hreflang.as_str(), link.href.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("en", "/tours"),
                ("es", "/es/tours"),
                ("fr", "/fr/tours"),
                ("x-default", "/tours"),
            ]
        );
    }

    #[test]
    fn test_context_serializes_camel_case() {
        let context = detect_server_language(&HeaderMap::new(), None, &settings(), &LanguageCode::hard_fallback());
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["language"], "en");
        assert_eq!(json["defaultLanguage"], "en");
        assert_eq!(json["availableLanguages"][1], "es");
    }
}
