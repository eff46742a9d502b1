//! Request signals: the language cookie and the internal signaling header.
//!
//! The edge router and the client context both write the same cookie, so
//! the attributes live in one place.

use crate::i18n::LanguageCode;
use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{time::Duration, Cookie, SameSite};

/// Name of the persistent language cookie.
pub const LANGUAGE_COOKIE: &str = "tourealo-lang";

/// Internal header carrying the edge router's decision to the render layer.
pub const LANGUAGE_HEADER: &str = "x-tourealo-lang";

/// One year.
pub const LANGUAGE_COOKIE_MAX_AGE_SECS: i64 = 31_536_000;

/// Build the language cookie for `language`.
pub fn language_cookie(language: &LanguageCode) -> Cookie<'static> {
    Cookie::build((LANGUAGE_COOKIE, language.to_string()))
        .path("/")
        .max_age(Duration::seconds(LANGUAGE_COOKIE_MAX_AGE_SECS))
        .same_site(SameSite::Lax)
        .build()
}

/// `Set-Cookie` header value for `language`.
///
/// Returns `None` if the code cannot be carried in a header.
pub fn set_cookie_value(language: &LanguageCode) -> Option<HeaderValue> {
    HeaderValue::try_from(language_cookie(language).to_string()).ok()
}

/// Read the language cookie from every `Cookie` header on a request.
pub fn language_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == LANGUAGE_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Read the signaling header.
pub fn language_from_signal(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(LANGUAGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
