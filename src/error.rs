//! Application error taxonomy and the single error-to-response boundary.
//!
//! # Responsibilities
//! - Classify every failure a handler can produce
//! - Convert each class to its HTTP status and envelope exactly once
//! - Suppress internal detail in production, surface it everywhere else
//!
//! # Design Decisions
//! - Handlers return `Result<_, AppError>`; no handler writes an error body
//!   itself, so the wire shape cannot drift between endpoints
//! - Backend failures never expose their text to production clients; the
//!   message stays generic and the specifics go to the log

use std::time::Duration;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::config;
use crate::db::DbError;
use crate::http::envelope::ApiResponse;
use crate::storage::UploadError;
use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Client input violated one or more field rules.
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    /// Malformed request outside the field-rule vocabulary (bad JSON, bad
    /// multipart, out-of-range pagination).
    #[error("{0}")]
    BadRequest(String),
    /// The named resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Missing or wrong admin credential.
    #[error("authentication required")]
    Unauthorized,
    /// Client exceeded its submission window.
    #[error("too many requests")]
    RateLimited { retry_after: Duration },
    /// The persistence backend failed or refused.
    #[error(transparent)]
    Db(#[from] DbError),
    /// Resume intake failed, client- or backend-caused.
    #[error(transparent)]
    Upload(#[from] UploadError),
    /// Anything that should never happen.
    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid form data: {}", error.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(format!("Invalid form data: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, message, errors, detail) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(errors),
                None,
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None, None),
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found"), None, None)
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                None,
                None,
            ),
            AppError::RateLimited { retry_after: wait } => {
                retry_after = Some(ceil_secs(wait));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many requests. Please try again later.".to_string(),
                    None,
                    None,
                )
            }
            AppError::Db(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to process your request right now. Please try again later.".to_string(),
                None,
                Some(err.to_string()),
            ),
            AppError::Upload(err) => match err {
                UploadError::Backend(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Unable to store your resume right now. Please try again later.".to_string(),
                    None,
                    Some(err.to_string()),
                ),
                client_caused => (
                    StatusCode::BAD_REQUEST,
                    client_caused.to_string(),
                    None,
                    None,
                ),
            },
            AppError::Internal(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
                None,
                Some(detail),
            ),
        };

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                detail = detail.as_deref().unwrap_or(""),
                "request failed"
            );
        }

        let detail = if config::runtime_env().is_production() {
            None
        } else {
            detail
        };

        let mut body = ApiResponse::failure(message).with_detail(detail);
        if let Some(errors) = errors {
            body = body.with_errors(errors);
        }
        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
