//! HTTP wiring: the edge router in front of the page routes.
//!
//! The edge router must run before routing so its rewrites are routed, so
//! it wraps the inner router as a service instead of being added with
//! `Router::layer`.

use crate::client::LanguageContextValue;
use crate::detector::{AlternateLink, LanguageServerContextValue, ServerLanguage};
use crate::edge::edge_router;
use crate::settings::SettingsProvider;
use axum::{
    extract::FromRef,
    http::Uri,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::Layer;
use tower_http::trace::TraceLayer;

/// State shared by the page handlers.
#[derive(Clone)]
pub struct AppState {
    /// Settings used while rendering, separate from the edge router's.
    pub settings: Arc<dyn SettingsProvider>,
}

impl FromRef<AppState> for Arc<dyn SettingsProvider> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.settings)
    }
}

/// What a page render knows about its language.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLanguage {
    pub path: String,
    pub canonical_path: String,
    pub alternates: Vec<AlternateLink>,
    pub server: LanguageServerContextValue,
    /// Snapshot handed to client components for hydration.
    pub client: LanguageContextValue,
}

/// Build the application router.
pub fn app(edge_settings: Arc<dyn SettingsProvider>, state: AppState) -> Router {
    let pages = Router::new()
        .route("/health", get(health))
        .fallback(render_page)
        .with_state(state);

    let edge = middleware::from_fn_with_state(edge_settings, edge_router).layer(pages);

    Router::new()
        .fallback_service(edge)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn render_page(ServerLanguage(server): ServerLanguage, uri: Uri) -> Json<PageLanguage> {
    let path = uri.path().to_string();

    Json(PageLanguage {
        canonical_path: server.canonical_path(&path),
        alternates: server.alternate_paths(&path),
        client: LanguageContextValue::from(&server),
        server,
        path,
    })
}
