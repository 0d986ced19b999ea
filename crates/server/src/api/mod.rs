pub mod config;
pub mod content;
pub mod health;
pub mod openapi;
pub mod schemas;
pub mod stream;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use ephemera_relay::ContentRelay;

use self::openapi::ApiDoc;
use self::stream::ObserverLimiter;
use crate::config::StreamConfig;

/// Room for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The share pipeline and broadcast hub.
    pub relay: Arc<ContentRelay>,
    /// Global cap on open event streams.
    pub observers: Arc<ObserverLimiter>,
    /// Event stream settings.
    pub stream: StreamConfig,
    /// Path to the browser UI static files.
    pub ui_path: Option<String>,
    /// Whether the browser UI is enabled.
    pub ui_enabled: bool,
}

impl AppState {
    /// State with the given relay and stream settings and no UI.
    pub fn new(relay: Arc<ContentRelay>, stream: StreamConfig) -> Self {
        Self {
            observers: Arc::new(ObserverLimiter::new(stream.max_observers)),
            relay,
            stream,
            ui_path: None,
            ui_enabled: false,
        }
    }

    /// Serve the browser UI from `path`.
    #[must_use]
    pub fn with_ui(mut self, path: impl Into<String>) -> Self {
        self.ui_path = Some(path.into());
        self.ui_enabled = true;
        self
    }
}

/// Request body cap: the largest accepted file plus multipart framing.
pub fn body_limit(max_file_size: u64) -> usize {
    usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    let limit = body_limit(state.relay.limits().max_file_size);

    let api = Router::new()
        // Health & metrics
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        // Client configuration
        .route("/api/config", get(config::get_config))
        // Content
        .route("/api/content", get(content::list_content))
        .route("/api/content/{id}", get(content::get_content))
        .route("/api/text", post(content::share_text))
        .route("/api/upload", post(content::upload_file))
        .route("/api/files/{id}", get(content::download_file))
        // SSE event streaming
        .route("/api/events", get(stream::events))
        // OpenAPI document
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(DefaultBodyLimit::max(limit));

    let mut router = Router::new().merge(api);

    // Serve the browser UI if enabled and the directory exists.
    if let Some(path_str) = state.ui_path.as_ref().filter(|_| state.ui_enabled) {
        let path = std::path::PathBuf::from(path_str);
        if path.exists() {
            let index_path = path.join("index.html");
            router = router.fallback_service(ServeDir::new(path).fallback(ServeFile::new(index_path)));
        } else {
            tracing::warn!(
                path = %path.display(),
                "UI directory not found, UI will not be served"
            );
        }
    }

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
