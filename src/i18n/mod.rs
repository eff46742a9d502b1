//! Language negotiation for the marketplace frontend.
//!
//! Everything in here is pure: no I/O, no clock, no global state. The edge
//! router, the server detector and the client context all build on it so
//! they cannot disagree about which language a request resolves to.
//!
//! # Architecture
//!
//! - `language`: `LanguageCode`, normalization and supported-set construction
//! - `accept`: best-effort `Accept-Language` parsing
//! - `resolve`: the precedence algorithm (`resolve_language`)
//! - `paths`: locale-prefixed URL and `lang` query helpers
//!
//! # Example
//!
//! ```rust
//! use tourealo_locale::i18n::{
//!     ensure_supported_languages, parse_accept_language_header, resolve_language,
//!     LanguageResolutionInput,
//! };
//!
//! let available = ensure_supported_languages(["en", "es"], None);
//! let header = parse_accept_language_header("es-MX,es;q=0.9,en;q=0.8");
//!
//! let language = resolve_language(&LanguageResolutionInput {
//!     header_languages: &header,
//!     available_languages: Some(available.as_slice()),
//!     fallback_language: Some("en"),
//!     ..Default::default()
//! });
//! assert_eq!(language, "es");
//! ```

mod accept;
mod language;
mod paths;
mod resolve;

pub use accept::{parse_accept_language_header, parse_weighted_languages, WeightedLanguage};
pub use language::{
    ensure_supported_languages, normalize_language, LanguageCode, HARD_FALLBACK_LANGUAGE,
};
pub use paths::{
    lang_query_value, language_prefix, localized_path, query_with_lang, query_without_lang,
    split_locale_segment, strip_locale_prefix, with_query, LocaleSegment, LANG_QUERY_PARAM,
};
pub use resolve::{resolve_language, LanguageResolutionInput};
