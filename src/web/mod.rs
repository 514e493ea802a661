//! Browser UI: one static page plus the JSON API behind it.

mod handlers;

use crate::app::StylistApp;
use crate::config::{AppConfig, ServerConfig};
use crate::core::SessionStore;
use crate::utils::error::{ErrorCategory, Result, StylistError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use handlers::{
    handle_find_outfits, handle_garment_image, handle_health, handle_index, handle_try_on,
    handle_try_on_set,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<StylistApp>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(app: StylistApp, server: &ServerConfig) -> Self {
        Self {
            app: Arc::new(app),
            sessions: Arc::new(SessionStore::new(server.max_sessions)),
        }
    }
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/health", get(handle_health))
        .route("/api/outfits", post(handle_find_outfits))
        .route(
            "/api/sessions/{id}/garments/{kind}/{index}",
            get(handle_garment_image),
        )
        .route("/api/try-on", post(handle_try_on))
        .route("/api/try-on/set", post(handle_try_on_set))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
}

/// Builds the providers from `config` and serves the UI until the process stops.
pub async fn run_server(config: AppConfig) -> Result<()> {
    let app = StylistApp::from_config(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| StylistError::InvalidConfigValueError {
            field: "server.host".to_string(),
            value: config.server.host.clone(),
            reason: format!("{}", e),
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    serve_with_listener(listener, app, &config.server).await
}

/// Serves from a pre-bound listener.
pub async fn serve_with_listener(
    listener: tokio::net::TcpListener,
    app: StylistApp,
    server: &ServerConfig,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let router = router(AppState::new(app, server), server);

    tracing::info!("🌐 Fitting room listening on http://{}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

/// Maps crate errors onto HTTP responses with a `{error, suggestion}` body.
pub struct ApiError(pub StylistError);

impl From<StylistError> for ApiError {
    fn from(err: StylistError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match (&self.0, self.0.category()) {
            (StylistError::NotFound { .. }, _) => StatusCode::NOT_FOUND,
            (StylistError::TryOnTimeout { .. }, _) => StatusCode::GATEWAY_TIMEOUT,
            (_, ErrorCategory::Input) => StatusCode::BAD_REQUEST,
            (_, ErrorCategory::Provider | ErrorCategory::Network) => StatusCode::BAD_GATEWAY,
            (_, ErrorCategory::Configuration | ErrorCategory::System) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {} ({:?})", self.0, self.0.category());
        } else {
            tracing::warn!("Request rejected: {}", self.0);
        }

        let body = serde_json::json!({
            "error": self.0.user_friendly_message(),
            "suggestion": self.0.recovery_suggestion(),
        });
        (status, Json(body)).into_response()
    }
}
