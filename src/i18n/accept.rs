//! Best-effort `Accept-Language` parsing.
//!
//! The parser extracts a preference signal; it does not validate the
//! header. Segments it cannot make sense of are dropped.
//!
//! Hand-rolled because `accept-language` discards entries with a malformed
//! `q`, while here they keep weight 1.

use crate::i18n::language::{normalize_language, LanguageCode};
use std::cmp::Ordering;

/// Quality weight assumed when `q` is absent or unparsable.
const DEFAULT_WEIGHT: f32 = 1.0;

/// A single language candidate from an `Accept-Language` header.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedLanguage {
    pub code: LanguageCode,
    pub weight: f32,
}

/// Parse a header value into weighted candidates, highest weight first.
///
/// Candidates with equal weight keep their header order. Wildcards and
/// segments whose tag does not normalize are skipped.
pub fn parse_weighted_languages(header: &str) -> Vec<WeightedLanguage> {
    let mut candidates: Vec<WeightedLanguage> = header
        .split(',')
        .filter_map(parse_segment)
        .collect();

    // sort_by is stable, so ties stay in header order
    candidates.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
    candidates
}

/// Parse a header value into normalized codes ordered by preference.
///
/// Duplicate codes (`en-US, en;q=0.8`) are reported once, at the position
/// of their highest weight.
///
/// # Example
/// ```
/// use tourealo_locale::i18n::parse_accept_language_header;
///
/// let codes = parse_accept_language_header("es;q=0.5, en;q=0.9");
/// assert_eq!(codes, vec!["en", "es"]);
/// ```
pub fn parse_accept_language_header(header: &str) -> Vec<LanguageCode> {
    let mut codes: Vec<LanguageCode> = Vec::new();
    for candidate in parse_weighted_languages(header) {
        if !codes.contains(&candidate.code) {
            codes.push(candidate.code);
        }
    }
    codes
}

fn parse_segment(segment: &str) -> Option<WeightedLanguage> {
    let mut parts = segment.split(';');
    let tag = parts.next()?.trim();
    if tag.is_empty() || tag == "*" {
        return None;
    }
    let code = normalize_language(tag)?;

    let weight = parts
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim().eq_ignore_ascii_case("q").then(|| value.trim())
        })
        .next()
        .map(parse_weight)
        .unwrap_or(DEFAULT_WEIGHT);

    Some(WeightedLanguage { code, weight })
}

fn parse_weight(raw: &str) -> f32 {
    match raw.parse::<f32>() {
        Ok(weight) if weight.is_finite() => weight,
        _ => DEFAULT_WEIGHT,
    }
}
