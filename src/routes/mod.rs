//! Route dispatcher.
//!
//! # Responsibilities
//! - Bind verbs and paths to handlers
//! - Apply per-flow middleware in submission order: rate limit, then the
//!   handler's own sanitize/validate/persist sequence
//! - Scope body limits (a JSON ceiling for the contact flow, the upload
//!   ceiling plus headroom for the multipart flow)
//! - Mount the admin router only when a credential is configured
//!
//! # Design Decisions
//! - Rate limiting guards the two submission POSTs only; health, test and
//!   catalog reads stay unthrottled for monitors and the frontend

pub mod admin;
pub mod careers;
pub mod contact;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::http::envelope::ApiResponse;
use crate::http::server::AppState;
use crate::security::rate_limit_middleware;

/// Headroom on top of the upload ceiling for the other multipart fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Assemble every route. Global layers are the server's business.
pub fn router(state: &AppState) -> Router<AppState> {
    let contact_submit = Router::new()
        .route("/api/contact", post(contact::submit))
        .route_layer(middleware::from_fn_with_state(
            state.contact_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes));

    let careers_submit = Router::new()
        .route("/api/careers/apply", post(careers::apply))
        .route_layer(middleware::from_fn_with_state(
            state.career_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(
            state.storage.max_bytes() + MULTIPART_OVERHEAD_BYTES,
        ));

    let public_reads = Router::new()
        .route("/health", get(liveness))
        .route("/api/contact/health", get(contact::health))
        .route("/api/contact/test", get(contact::connectivity_test))
        .route("/api/careers/positions", get(careers::positions));

    let mut router = contact_submit.merge(careers_submit).merge(public_reads);

    if state.config.admin.enabled() {
        router = router.nest(
            "/api/admin",
            admin::router(state)
                .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes)),
        );
        tracing::info!("admin surface enabled");
    }

    router
}

#[derive(Debug, Clone, Serialize)]
struct Liveness {
    status: &'static str,
    version: &'static str,
}

/// `GET /health` answers as long as the process runs; no backend involved.
async fn liveness() -> Json<ApiResponse<Liveness>> {
    Json(ApiResponse::success(
        "Service alive",
        Liveness {
            status: "alive",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}
