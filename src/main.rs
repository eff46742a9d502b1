use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tourealo_locale::config::Config;
use tourealo_locale::server::{self, AppState};
use tourealo_locale::settings::{HttpSettingsSource, SettingsCache, SettingsProvider};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tourealo_locale=info".parse()?),
        )
        .init();

    info!("Starting Tourealo locale service");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Settings endpoint: {}{} (fallback language '{}')",
        config.api_base_url, config.settings_path, config.default_language
    );

    // The edge router and the render layer each keep their own settings cache
    let edge_settings = settings_cache(&config)?;
    let render_settings = settings_cache(&config)?;

    let app = server::app(
        edge_settings,
        AppState {
            settings: render_settings,
        },
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn settings_cache(config: &Config) -> Result<Arc<dyn SettingsProvider>> {
    let source = HttpSettingsSource::new(&config.api_base_url, &config.settings_path)
        .context("Failed to build settings HTTP client")?;
    debug!("Settings cache backed by {}", source.url());
    let cache = SettingsCache::new(source, config.default_language.clone())
        .with_ttl(config.settings_cache_ttl);
    Ok(Arc::new(cache))
}
