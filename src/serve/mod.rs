//! HTTP JSON API over the analyzer, checker and mapping engine.
//!
//! Endpoints:
//! - GET  /health                    - Server status
//! - GET  /api/target-fields         - The built-in target schema
//! - POST /api/metadata/parse        - Document text to entities
//! - POST /api/metadata/validate     - Compatibility of two fields
//! - POST /api/metadata/rules/check  - Whether each rule's source resolves
//! - POST /api/metadata/apply        - Apply rules to a document
//! - POST /api/metadata/fetch        - Fetch a document by URL and parse it
//!
//! Failures are a non-2xx status with a `{"error": "..."}` body.

mod handlers;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::analyzer::{Analyzer, DEFAULT_MAX_DEPTH};

use self::handlers::{
    handle_apply, handle_check_rules, handle_fetch, handle_health, handle_not_found,
    handle_parse, handle_target_fields, handle_validate,
};

/// Maximum request body size: 10 MB.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub const DEFAULT_PORT: u16 = 3001;

/// Settings for [`serve`].
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub max_depth: usize,
    pub body_limit: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_PORT,
            max_depth: DEFAULT_MAX_DEPTH,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// State shared by every handler. It holds configuration only; requests are
/// independent of one another.
#[derive(Debug, Clone)]
pub struct AppState {
    pub analyzer: Analyzer,

    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            analyzer: Analyzer::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// A failed request, rendered as `{"error": message}`.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        let status = match e {
            crate::Error::Fetch(_) => StatusCode::BAD_GATEWAY,
            crate::Error::MalformedInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };

        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Builds the router with every route, CORS and the body limit.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/target-fields", get(handle_target_fields))
        .route("/api/metadata/parse", post(handle_parse))
        .route("/api/metadata/validate", post(handle_validate))
        .route("/api/metadata/rules/check", post(handle_check_rules))
        .route("/api/metadata/apply", post(handle_apply))
        .route("/api/metadata/fetch", post(handle_fetch))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.body_limit))
        .with_state(state)
}

/// Serves the API until Ctrl+C is received.
pub async fn serve(config: ServeConfig) -> std::io::Result<()> {
    let state = AppState {
        analyzer: Analyzer::new(config.max_depth),
        body_limit: config.body_limit,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!(%local, max_depth = config.max_depth, "json-mapper listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "could not listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
