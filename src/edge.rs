//! Edge router: locale-prefix handling for every inbound request.
//!
//! A request whose first path segment names a served language is either
//! redirected (default language, which is canonical at the unprefixed root)
//! or rewritten to the unprefixed path with `?lang=` and the signaling
//! header set. Everything else passes through untouched.

use crate::i18n::{
    localized_path, query_with_lang, query_without_lang, split_locale_segment, with_query,
    LanguageCode,
};
use crate::settings::{LanguageSettings, SettingsProvider};
use crate::signals::{set_cookie_value, LANGUAGE_HEADER};
use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::{header, uri::PathAndQuery, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// What the edge router does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// No served locale prefix; forward unchanged.
    PassThrough,
    /// Prefix names the default language; 308 to the unprefixed URL.
    Redirect {
        location: String,
        language: LanguageCode,
    },
    /// Prefix names another served language; rewrite internally.
    Rewrite {
        path_and_query: String,
        language: LanguageCode,
    },
}

/// Decide how to handle a request path and query against current settings.
///
/// Locale-shaped segments that are not served (`/ab/...`) are ordinary path
/// segments and pass through.
pub fn decide(path: &str, query: Option<&str>, settings: &LanguageSettings) -> EdgeDecision {
    let Some(segment) = split_locale_segment(path) else {
        return EdgeDecision::PassThrough;
    };

    if !settings.is_available(&segment.code) {
        return EdgeDecision::PassThrough;
    }

    // `/en//host` must not become the protocol-relative `//host`
    let path = localized_path(&segment.code, Some(&segment.code), segment.rest);

    if settings.is_default(&segment.code) {
        let query = query_without_lang(query);
        return EdgeDecision::Redirect {
            location: with_query(&path, query.as_deref()),
            language: segment.code,
        };
    }

    let query = query_with_lang(query, &segment.code);
    EdgeDecision::Rewrite {
        path_and_query: with_query(&path, Some(&query)),
        language: segment.code,
    }
}

/// Middleware applying [`decide`] to each request.
///
/// Client-supplied signaling headers are always dropped; the header is only
/// trusted when this router set it. Settings are fetched only for paths
/// with a locale-shaped first segment.
pub async fn edge_router(
    State(provider): State<Arc<dyn SettingsProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.headers_mut().remove(LANGUAGE_HEADER).is_some() {
        debug!("Dropped client-supplied {} header", LANGUAGE_HEADER);
    }

    if split_locale_segment(request.uri().path()).is_none() {
        return next.run(request).await;
    }

    let settings = provider.language_settings().await;
    let decision = decide(request.uri().path(), request.uri().query(), &settings);

    match decision {
        EdgeDecision::PassThrough => next.run(request).await,
        EdgeDecision::Redirect { location, language } => {
            debug!("Redirecting {} to canonical {}", request.uri(), location);
            let mut response = Redirect::permanent(&location).into_response();
            append_language_cookie(&mut response, &language);
            response
        }
        EdgeDecision::Rewrite {
            path_and_query,
            language,
        } => {
            let rewritten = match rewrite_uri(request.uri(), &path_and_query) {
                Ok(uri) => uri,
                Err(e) => {
                    warn!("Could not rewrite {} to {}: {}", request.uri(), path_and_query, e);
                    return next.run(request).await;
                }
            };
            debug!("Rewriting {} to {} ({})", request.uri(), rewritten, language);

            *request.uri_mut() = rewritten;
            if let Ok(value) = HeaderValue::from_str(language.as_str()) {
                request.headers_mut().insert(LANGUAGE_HEADER, value);
            }

            let mut response = next.run(request).await;
            append_language_cookie(&mut response, &language);
            response
        }
    }
}

fn rewrite_uri(uri: &Uri, path_and_query: &str) -> Result<Uri> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

fn append_language_cookie(response: &mut Response, language: &LanguageCode) {
    match set_cookie_value(language) {
        Some(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        None => warn!("Language '{}' cannot be stored in a cookie", language),
    }
}
