//! Integration tests for the locale service
//!
//! These tests drive the full router (edge router + page render) with
//! in-memory requests, against fixed settings or a mocked backend.

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware,
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::{Layer, ServiceExt};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use tourealo_locale::{
    edge::edge_router,
    i18n::LanguageCode,
    server::{self, AppState},
    settings::{
        HttpSettingsSource, LanguageSettings, RawLanguageSettings, SettingsCache,
        SettingsProvider, StaticSettings,
    },
    signals::LANGUAGE_HEADER,
};

// ==================== Test Helpers ====================

fn english() -> LanguageCode {
    LanguageCode::parse("en").unwrap()
}

/// Settings with English as the unprefixed default and Spanish prefixed
fn test_settings() -> Arc<dyn SettingsProvider> {
    Arc::new(StaticSettings::new(LanguageSettings::from_raw(
        RawLanguageSettings {
            available_languages: vec!["en".to_string(), "es".to_string()],
            default_language: Some("en".to_string()),
            fallback_language: None,
        },
        &english(),
    )))
}

fn test_app(settings: Arc<dyn SettingsProvider>) -> Router {
    server::app(Arc::clone(&settings), AppState { settings })
}

/// Edge router in front of a handler that echoes what it received
fn echo_app(settings: Arc<dyn SettingsProvider>) -> Router {
    let echo = Router::new().fallback(|request: Request| async move {
        let signal = request
            .headers()
            .get(LANGUAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        format!("{} {}", request.uri(), signal)
    });

    Router::new().fallback_service(middleware::from_fn_with_state(settings, edge_router).layer(echo))
}

fn get(uri: &str) -> Request {
    axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).expect("json body")
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ==================== Rewrite Tests ====================

#[tokio::test]
async fn test_non_default_prefix_is_rewritten() {
    let response = echo_app(test_settings())
        .oneshot(get("/es/tours"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).expect("language cookie");
    assert!(cookie.starts_with("tourealo-lang=es"));
    assert!(cookie.contains("Max-Age=31536000"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));

    assert_eq!(body_string(response).await, "/tours?lang=es es");
}

#[tokio::test]
async fn test_rewritten_page_renders_in_prefixed_language() {
    let response = test_app(test_settings())
        .oneshot(get("/es/tours?date=2024-06-01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;

    assert_eq!(page["path"], "/tours");
    assert_eq!(page["server"]["language"], "es");
    assert_eq!(page["canonicalPath"], "/es/tours");
    assert_eq!(page["client"]["language"], "es");
    assert_eq!(page["alternates"][0]["href"], "/tours");
    assert_eq!(page["alternates"][1]["href"], "/es/tours");
}

// ==================== Redirect Tests ====================

#[tokio::test]
async fn test_default_prefix_redirects_permanently() {
    let response = test_app(test_settings())
        .oneshot(get("/en/tours?lang=en"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/tours");
    let cookie = set_cookie(&response).expect("language cookie");
    assert!(cookie.starts_with("tourealo-lang=en"));
}

#[tokio::test]
async fn test_redirect_keeps_other_query_params() {
    let response = test_app(test_settings())
        .oneshot(get("/en/tours?guests=2&lang=es"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/tours?guests=2"
    );
}

#[tokio::test]
async fn test_redirect_stays_on_origin() {
    let response = test_app(test_settings())
        .oneshot(get("/en//evil.com/phish"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/evil.com/phish"
    );
}

#[tokio::test]
async fn test_rewrite_collapses_leading_slashes() {
    let response = echo_app(test_settings())
        .oneshot(get("/es//evil.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "/evil.com?lang=es es");
}

// ==================== Pass-through Tests ====================

#[tokio::test]
async fn test_unserved_prefix_passes_through() {
    let response = echo_app(test_settings())
        .oneshot(get("/xx/tours"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
    assert_eq!(body_string(response).await, "/xx/tours -");
}

#[tokio::test]
async fn test_client_signal_header_is_dropped() {
    let request = axum::http::Request::builder()
        .uri("/tours")
        .header(LANGUAGE_HEADER, "es")
        .body(Body::empty())
        .unwrap();

    let response = echo_app(test_settings()).oneshot(request).await.unwrap();
    assert_eq!(body_string(response).await, "/tours -");
}

#[tokio::test]
async fn test_unprefixed_page_uses_cookie() {
    let request = axum::http::Request::builder()
        .uri("/tours")
        .header(header::COOKIE, "tourealo-lang=es")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(Body::empty())
        .unwrap();

    let response = test_app(test_settings()).oneshot(request).await.unwrap();
    let page = body_json(response).await;

    assert_eq!(page["server"]["language"], "es");
    assert_eq!(page["canonicalPath"], "/es/tours");
}

#[tokio::test]
async fn test_unprefixed_page_uses_accept_language() {
    let request = axum::http::Request::builder()
        .uri("/")
        .header(header::ACCEPT_LANGUAGE, "fr;q=1, es;q=0.7, en;q=0.5")
        .body(Body::empty())
        .unwrap();

    let response = test_app(test_settings()).oneshot(request).await.unwrap();
    let page = body_json(response).await;

    assert_eq!(page["server"]["language"], "es");
    assert_eq!(page["canonicalPath"], "/es");
}

#[tokio::test]
async fn test_health() {
    let response = test_app(test_settings()).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

// ==================== Backend Settings Tests ====================

#[tokio::test]
async fn test_settings_fetched_from_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "availableLanguages": ["en", "es", "de"],
            "defaultLanguage": "de"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let source = HttpSettingsSource::new(&mock_server.uri(), "/settings").unwrap();
    let settings: Arc<dyn SettingsProvider> = Arc::new(SettingsCache::new(source, english()));
    let app = echo_app(settings);

    let response = app.clone().oneshot(get("/de/touren")).await.unwrap();
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);

    // Served from cache, the mock expects a single fetch
    let response = app.oneshot(get("/en/tours")).await.unwrap();
    assert_eq!(body_string(response).await, "/tours?lang=en en");
}

#[tokio::test]
async fn test_backend_down_falls_back_to_environment_default() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let source = HttpSettingsSource::new(&mock_server.uri(), "/settings").unwrap();
    let settings: Arc<dyn SettingsProvider> = Arc::new(SettingsCache::new(source, english()));
    let app = echo_app(settings);

    // Only the synthesized default is served, so /es is an ordinary segment
    let response = app.clone().oneshot(get("/es/tours")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "/es/tours -");

    let response = app.oneshot(get("/en/tours")).await.unwrap();
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
}
