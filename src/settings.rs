//! Language settings from the backend, behind a single-entry TTL cache.
//!
//! The backend owns the list of languages the site serves. The edge router
//! and the render layer both read it through [`SettingsProvider`]; when the
//! backend cannot be reached a single-language set is synthesized from the
//! environment default instead of failing the request.

use crate::i18n::{ensure_supported_languages, normalize_language, LanguageCode};
use axum::async_trait;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long fetched settings are served before the next request refetches.
pub const DEFAULT_SETTINGS_TTL: Duration = Duration::from_secs(60);

/// Upper bound on a single settings request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to reach settings endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("settings endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode settings response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Settings payload as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLanguageSettings {
    pub available_languages: Vec<String>,
    pub default_language: Option<String>,
    pub fallback_language: Option<String>,
}

/// Normalized language settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageSettings {
    pub available_languages: Vec<LanguageCode>,
    pub fallback_language: LanguageCode,
    /// Language served unprefixed at the root. `None` when the backend
    /// configured none, in which case every language is prefixed.
    pub default_language: Option<LanguageCode>,
}

impl LanguageSettings {
    /// Normalize a backend payload.
    ///
    /// The default must be one of the available languages to count. The
    /// fallback is the backend's fallback if it is available, then the
    /// default, then the first available language, then `environment_default`.
    pub fn from_raw(raw: RawLanguageSettings, environment_default: &LanguageCode) -> Self {
        let requested_default = raw.default_language.as_deref().and_then(normalize_language);
        let seed = requested_default
            .clone()
            .unwrap_or_else(|| environment_default.clone());

        let available_languages =
            ensure_supported_languages(&raw.available_languages, Some(seed.as_str()));

        let default_language = requested_default.filter(|code| available_languages.contains(code));

        let fallback_language = raw
            .fallback_language
            .as_deref()
            .and_then(normalize_language)
            .filter(|code| available_languages.contains(code))
            .or_else(|| default_language.clone())
            .or_else(|| available_languages.first().cloned())
            .unwrap_or_else(|| environment_default.clone());

        Self {
            available_languages,
            fallback_language,
            default_language,
        }
    }

    /// Single-language settings used when the backend is unavailable.
    pub fn synthesized(environment_default: &LanguageCode) -> Self {
        Self {
            available_languages: vec![environment_default.clone()],
            fallback_language: environment_default.clone(),
            default_language: Some(environment_default.clone()),
        }
    }

    pub fn is_available(&self, code: &LanguageCode) -> bool {
        self.available_languages.contains(code)
    }

    pub fn is_default(&self, code: &LanguageCode) -> bool {
        self.default_language.as_ref() == Some(code)
    }
}

/// Where raw settings come from.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch(&self) -> Result<RawLanguageSettings, SettingsError>;
}

/// Fetches settings from the backend REST API.
#[derive(Debug, Clone)]
pub struct HttpSettingsSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSettingsSource {
    /// Build a source for `{api_base_url}{settings_path}` with a bounded timeout.
    pub fn new(api_base_url: &str, settings_path: &str) -> Result<Self, SettingsError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, api_base_url, settings_path))
    }

    pub fn with_client(client: reqwest::Client, api_base_url: &str, settings_path: &str) -> Self {
        let url = format!(
            "{}/{}",
            api_base_url.trim_end_matches('/'),
            settings_path.trim_start_matches('/')
        );
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SettingsSource for HttpSettingsSource {
    async fn fetch(&self) -> Result<RawLanguageSettings, SettingsError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(SettingsError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Read access to the current language settings.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn language_settings(&self) -> Arc<LanguageSettings>;

    /// Environment-configured default, used by the resolver's hard fallback.
    fn environment_default(&self) -> &LanguageCode;
}

#[derive(Debug)]
struct CachedSettings {
    settings: Arc<LanguageSettings>,
    fetched_at: Instant,
}

/// Single-entry TTL cache over a [`SettingsSource`].
///
/// The entry is replaced wholesale on refresh, never mutated. The lock is
/// not held across the fetch, so concurrent refreshes can race; the last
/// one to finish wins.
pub struct SettingsCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    environment_default: LanguageCode,
    entry: RwLock<Option<CachedSettings>>,
}

impl<S: SettingsSource> SettingsCache<S, SystemClock> {
    pub fn new(source: S, environment_default: LanguageCode) -> Self {
        Self::with_clock(source, SystemClock, environment_default)
    }
}

impl<S: SettingsSource, C: Clock> SettingsCache<S, C> {
    pub fn with_clock(source: S, clock: C, environment_default: LanguageCode) -> Self {
        Self {
            source,
            clock,
            ttl: DEFAULT_SETTINGS_TTL,
            environment_default,
            entry: RwLock::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Current settings, refetching if the entry is missing or expired.
    pub async fn get(&self) -> Arc<LanguageSettings> {
        if let Some(settings) = self.fresh_entry() {
            return settings;
        }

        let settings = Arc::new(self.load().await);
        let mut entry = self.entry.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *entry = Some(CachedSettings {
            settings: Arc::clone(&settings),
            fetched_at: self.clock.now(),
        });
        settings
    }

    fn fresh_entry(&self) -> Option<Arc<LanguageSettings>> {
        let entry = self.entry.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let cached = entry.as_ref()?;
        let age = self.clock.now().saturating_duration_since(cached.fetched_at);
        (age < self.ttl).then(|| Arc::clone(&cached.settings))
    }

    async fn load(&self) -> LanguageSettings {
        debug!("Refreshing language settings");
        match self.source.fetch().await {
            Ok(raw) => {
                let settings = LanguageSettings::from_raw(raw, &self.environment_default);
                info!(
                    "Loaded {} language(s), default: {:?}",
                    settings.available_languages.len(),
                    settings.default_language.as_ref().map(LanguageCode::as_str)
                );
                settings
            }
            Err(e) => {
                warn!(
                    "Language settings unavailable ({}), falling back to '{}'",
                    e, self.environment_default
                );
                LanguageSettings::synthesized(&self.environment_default)
            }
        }
    }
}

#[async_trait]
impl<S: SettingsSource, C: Clock> SettingsProvider for SettingsCache<S, C> {
    async fn language_settings(&self) -> Arc<LanguageSettings> {
        self.get().await
    }

    fn environment_default(&self) -> &LanguageCode {
        &self.environment_default
    }
}

/// Fixed settings, for wiring without a backend.
#[derive(Debug, Clone)]
pub struct StaticSettings {
    settings: Arc<LanguageSettings>,
    environment_default: LanguageCode,
}

impl StaticSettings {
    pub fn new(settings: LanguageSettings) -> Self {
        let environment_default = settings.fallback_language.clone();
        Self {
            settings: Arc::new(settings),
            environment_default,
        }
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn language_settings(&self) -> Arc<LanguageSettings> {
        Arc::clone(&self.settings)
    }

    fn environment_default(&self) -> &LanguageCode {
        &self.environment_default
    }
}
