//! Contact form endpoints: submission, health, connectivity test.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::error::AppError;
use crate::forms::{build_contact, contact_reference, ContactPayload};
use crate::http::envelope::ApiResponse;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::sanitize_fields;

/// Receipt returned to the submitter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub id: i64,
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
}

/// `POST /api/contact`
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ContactReceipt>>), AppError> {
    let started = Instant::now();
    let Json(payload) = payload?;

    let fields = sanitize_fields(&payload.into_fields());
    let record = match build_contact(&fields) {
        Ok(record) => record,
        Err(errors) => {
            metrics::record_submission("contact", "invalid", started);
            return Err(AppError::Validation(errors));
        }
    };

    let row = match state.gateway.insert_contact(&record).await {
        Ok(row) => row,
        Err(err) => {
            metrics::record_submission("contact", "backend_error", started);
            return Err(err.into());
        }
    };

    metrics::record_submission("contact", "accepted", started);
    tracing::info!(id = row.id, "contact submission stored");

    let receipt = ContactReceipt {
        id: row.id,
        reference: contact_reference(row.id),
        submitted_at: row.created_at,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Thank you for reaching out! We will get back to you soon.",
            receipt,
        )),
    ))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub database: &'static str,
    pub api: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceHealth,
    pub environment: &'static str,
    pub version: &'static str,
}

/// `GET /api/contact/health`
///
/// 200 when the persistence backend answered the probe, 503 otherwise. The
/// process itself is always `api: up` here; liveness has its own endpoint.
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let database_up = state.gateway.probe().await.is_ok();

    let data = HealthData {
        status: if database_up { "healthy" } else { "degraded" },
        timestamp: Utc::now(),
        services: ServiceHealth {
            database: if database_up { "up" } else { "down" },
            api: "up",
        },
        environment: state.config.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
    };

    let (status, message) = if database_up {
        (StatusCode::OK, "Service healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Persistence backend unreachable")
    };
    let body = ApiResponse {
        success: database_up,
        message: message.to_string(),
        data: Some(data),
        errors: None,
        detail: None,
    };
    (status, Json(body))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityData {
    pub connected: bool,
    pub timestamp: DateTime<Utc>,
    pub database: String,
}

/// `GET /api/contact/test`
///
/// Diagnostic used by the frontend during setup. Always 200; the probe
/// outcome is in the body.
pub async fn connectivity_test(
    State(state): State<AppState>,
) -> Json<ApiResponse<ConnectivityData>> {
    let connected = state.gateway.probe().await.is_ok();
    let database = Url::parse(state.gateway.backend_url())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| state.gateway.backend_url().to_string());

    let message = if connected {
        "Backend connection verified"
    } else {
        "Backend connection failed"
    };
    Json(ApiResponse::success(
        message,
        ConnectivityData {
            connected,
            timestamp: Utc::now(),
            database,
        },
    ))
}
