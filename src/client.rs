//! Client-side language state and in-app language switching.
//!
//! A [`LanguageStore`] holds an immutable [`LanguageContextValue`] snapshot.
//! Readers take the current `Arc`; [`LanguageStore::set_language`] is the
//! only way to change it, and swaps in a whole new snapshot before
//! navigating to the same page under the new prefix.

use crate::detector::LanguageServerContextValue;
use crate::i18n::{
    language_prefix, localized_path, normalize_language, query_without_lang, strip_locale_prefix,
    with_query, LanguageCode,
};
use crate::signals::language_cookie;
use cookie::Cookie;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Language state visible to client components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageContextValue {
    pub language: LanguageCode,
    pub default_language: Option<LanguageCode>,
    pub available_languages: Vec<LanguageCode>,
    pub fallback_language: Option<LanguageCode>,
}

impl From<&LanguageServerContextValue> for LanguageContextValue {
    fn from(server: &LanguageServerContextValue) -> Self {
        Self {
            language: server.language.clone(),
            default_language: server.default_language.clone(),
            available_languages: server.available_languages.clone(),
            fallback_language: server.fallback_language.clone(),
        }
    }
}

impl LanguageContextValue {
    /// Language used when a switch targets something unsupported.
    ///
    /// Fallback, then default, then first available, then `"en"`.
    pub fn fallback_for_state(&self) -> LanguageCode {
        self.fallback_language
            .clone()
            .or_else(|| self.default_language.clone())
            .or_else(|| self.available_languages.first().cloned())
            .unwrap_or_else(LanguageCode::hard_fallback)
    }

    /// Normalize `target` and keep it only if it is available.
    pub fn supported_or_fallback(&self, target: &str) -> LanguageCode {
        normalize_language(target)
            .filter(|code| self.available_languages.is_empty() || self.available_languages.contains(code))
            .unwrap_or_else(|| self.fallback_for_state())
    }

    /// Link prefix for the active language (`""` or `"/es"`).
    pub fn prefix(&self) -> String {
        language_prefix(&self.language, self.default_language.as_ref())
    }

    /// Prefix an in-app href for the active language.
    ///
    /// Hrefs that already carry an available prefix are re-prefixed rather
    /// than double-prefixed. External and non-rooted hrefs are returned as is.
    pub fn localized_href(&self, href: &str) -> String {
        if !href.starts_with('/') || href.starts_with("//") {
            return href.to_string();
        }
        let location = Location::parse(href);
        let base = strip_locale_prefix(&location.path, &self.available_languages);
        let path = localized_path(&self.language, self.default_language.as_ref(), base);
        with_query(&path, location.query.as_deref())
    }

    /// Current location rebuilt for `target`.
    ///
    /// Any existing locale prefix is removed, the new prefix is applied
    /// (none for the default language) and `lang` is dropped from the query.
    pub fn build_localized_path(&self, target: &LanguageCode, location: &Location) -> String {
        let base = strip_locale_prefix(&location.path, &self.available_languages);
        let path = localized_path(target, self.default_language.as_ref(), base);
        let query = query_without_lang(location.query.as_deref());
        with_query(&path, query.as_deref())
    }
}

/// The browser location a language switch starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
}

impl Location {
    /// Split an href into path and query, dropping any fragment.
    pub fn parse(href: &str) -> Self {
        let href = href.split('#').next().unwrap_or_default();
        let (path, query) = match href.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (href, None),
        };
        let path = if path.is_empty() { "/" } else { path };
        Self {
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()),
        }
    }
}

/// Persists the language cookie on the client.
pub trait CookieWriter {
    fn write_cookie(&self, cookie: Cookie<'static>);
}

/// Client-side navigation.
pub trait Navigator {
    fn push(&self, href: &str);
    /// Refetch server data for the current route.
    fn refresh(&self);
}

/// Result of a language switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChange {
    pub language: LanguageCode,
    pub href: String,
}

/// Holds the current [`LanguageContextValue`] snapshot.
#[derive(Debug)]
pub struct LanguageStore {
    snapshot: RwLock<Arc<LanguageContextValue>>,
    changing: AtomicBool,
}

impl LanguageStore {
    pub fn new(initial: LanguageContextValue) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(initial)),
            changing: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> Arc<LanguageContextValue> {
        let snapshot = self.snapshot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*snapshot)
    }

    /// Whether a language switch is in progress.
    pub fn is_changing(&self) -> bool {
        self.changing.load(Ordering::SeqCst)
    }

    /// Switch to `target`, persist it and navigate to the localized location.
    pub fn set_language<W, N>(
        &self,
        target: &str,
        location: &Location,
        cookies: &W,
        navigator: &N,
    ) -> LanguageChange
    where
        W: CookieWriter + ?Sized,
        N: Navigator + ?Sized,
    {
        let _transition = Transition::begin(&self.changing);
        let current = self.snapshot();

        let language = current.supported_or_fallback(target);
        cookies.write_cookie(language_cookie(&language));

        let href = current.build_localized_path(&language, location);
        debug!("Switching language to {} ({})", language, href);

        self.replace(LanguageContextValue {
            language: language.clone(),
            ..(*current).clone()
        });

        navigator.push(&href);
        navigator.refresh();

        LanguageChange { language, href }
    }

    fn replace(&self, next: LanguageContextValue) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *snapshot = Arc::new(next);
    }
}

/// Marks a language switch as in progress until dropped.
struct Transition<'a> {
    flag: &'a AtomicBool,
}

impl<'a> Transition<'a> {
    fn begin(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
