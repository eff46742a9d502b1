use crate::i18n::{normalize_language, LanguageCode};
use crate::settings::DEFAULT_SETTINGS_TTL;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Backend
    pub api_base_url: String,
    pub settings_path: String,

    // Languages
    pub default_language: LanguageCode,
    pub settings_cache_ttl: Duration,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var("API_BASE_URL")
            .or_else(|_| std::env::var("NEXT_PUBLIC_API_BASE_URL"))
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        reqwest::Url::parse(&api_base_url)
            .with_context(|| format!("API_BASE_URL is not a valid URL: {}", api_base_url))?;

        Ok(Self {
            api_base_url,
            settings_path: std::env::var("SETTINGS_PATH")
                .unwrap_or_else(|_| "/settings".to_string()),

            // Hard fallback when the backend is unreachable
            default_language: std::env::var("NEXT_PUBLIC_DEFAULT_LANGUAGE")
                .ok()
                .and_then(|v| normalize_language(&v))
                .unwrap_or_else(LanguageCode::hard_fallback),
            settings_cache_ttl: std::env::var("SETTINGS_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SETTINGS_TTL),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        })
    }
}
