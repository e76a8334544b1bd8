//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared application state (backend clients, rate limiters)
//! - Assemble the Axum router with the global middleware stack
//! - Bind to the listener and serve until shutdown
//!
//! # Design Decisions
//! - Layer order, outermost first: request-id, trace, CORS, security
//!   headers, timeout. The request id exists before the trace span opens, so
//!   every log line of a request carries it
//! - CORS is permissive only when no allow-list is configured, which config
//!   validation forbids in production

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::db::{DbError, Gateway, RestClient};
use crate::routes;
use crate::security::RateLimiter;
use crate::storage::{StorageClient, StorageError};

/// Failure building the shared clients at startup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("persistence client setup failed: {0}")]
    Db(#[from] DbError),
    #[error("storage client setup failed: {0}")]
    Storage(#[from] StorageError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Gateway,
    pub storage: StorageClient,
    pub contact_limiter: Arc<RateLimiter>,
    pub career_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, SetupError> {
        let gateway = Gateway::new(RestClient::new(&config.backend)?);
        let storage = StorageClient::new(&config.backend, &config.storage)?;
        let contact_limiter = Arc::new(RateLimiter::new(
            "contact",
            config.contact_rate.max_requests,
            Duration::from_secs(config.contact_rate.window_secs),
            config.server.trust_proxy,
        ));
        let career_limiter = Arc::new(RateLimiter::new(
            "careers",
            config.career_rate.max_requests,
            Duration::from_secs(config.career_rate.window_secs),
            config.server.trust_proxy,
        ));
        Ok(Self {
            config: Arc::new(config),
            gateway,
            storage,
            contact_limiter,
            career_limiter,
        })
    }
}

/// HTTP server for the forms API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, SetupError> {
        let state = AppState::new(config)?;
        let router = Self::build_router(state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        routes::router(&state)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(cors_layer(&config))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        // No allow-list (or an explicit wildcard): development convenience.
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PATCH])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
