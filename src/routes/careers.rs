//! Career application endpoints: multipart intake and the positions catalog.
//!
//! Intake order matters: parts are buffered, fields validated, and only then
//! is the resume forwarded to storage, so a rejected application never leaves
//! a stored file behind. If the insert fails after a successful upload, the
//! object is deleted again on a best-effort basis.

use std::time::Instant;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::forms::{
    application_number, build_application, position_catalog, ApplicationStatus, Position,
    PositionOption,
};
use crate::http::envelope::ApiResponse;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::sanitize_fields;
use crate::storage::UploadError;
use crate::validation::FieldMap;

const RESUME_FIELD: &str = "resume";

/// A buffered resume part, type-checked but not yet stored.
struct ResumeUpload {
    filename: String,
    content_type: String,
    ext: &'static str,
    data: Vec<u8>,
}

/// Receipt returned to the applicant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationReceipt {
    pub id: i64,
    pub application_number: String,
    pub submitted_at: DateTime<Utc>,
    pub position: Position,
    pub status: ApplicationStatus,
}

/// `POST /api/careers/apply`
pub async fn apply(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ApplicationReceipt>>), AppError> {
    let started = Instant::now();

    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            metrics::record_submission("careers", "invalid", started);
            return Err(rejection.into());
        }
    };

    let (raw_fields, resume) = match read_form(&state, multipart).await {
        Ok(parts) => parts,
        Err(err) => {
            metrics::record_submission("careers", "invalid", started);
            return Err(err);
        }
    };

    let fields = sanitize_fields(&raw_fields);
    let mut record = match build_application(&fields, None) {
        Ok(record) => record,
        Err(errors) => {
            metrics::record_submission("careers", "invalid", started);
            return Err(AppError::Validation(errors));
        }
    };

    // Fields are valid; only now does the resume go to storage.
    let mut stored_key = None;
    if let Some(upload) = resume {
        let key = state.storage.object_key(Some(&upload.filename), upload.ext);
        let url = match state
            .storage
            .store_resume(&key, &upload.content_type, upload.data)
            .await
        {
            Ok(url) => url,
            Err(err) => {
                metrics::record_submission("careers", "backend_error", started);
                return Err(UploadError::Backend(err).into());
            }
        };
        record.resume_url = Some(url);
        record.resume_filename = Some(upload.filename);
        stored_key = Some(key);
    }

    let row = match state.gateway.insert_application(&record).await {
        Ok(row) => row,
        Err(err) => {
            if let Some(key) = stored_key {
                match state.storage.delete(&key).await {
                    Ok(()) => {
                        tracing::info!(key = %key, "removed stored resume after failed insert")
                    }
                    Err(cleanup) => tracing::warn!(
                        key = %key,
                        error = %cleanup,
                        "could not remove stored resume after failed insert"
                    ),
                }
            }
            metrics::record_submission("careers", "backend_error", started);
            return Err(err.into());
        }
    };

    metrics::record_submission("careers", "accepted", started);
    tracing::info!(
        id = row.id,
        position = row.position.value(),
        has_resume = row.resume_url.is_some(),
        "career application stored"
    );

    let receipt = ApplicationReceipt {
        id: row.id,
        application_number: application_number(row.id),
        submitted_at: row.applied_at,
        position: row.position,
        status: row.application_status,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Application submitted successfully! We will review it and get back to you.",
            receipt,
        )),
    ))
}

/// `GET /api/careers/positions`
pub async fn positions() -> Json<ApiResponse<Vec<PositionOption>>> {
    Json(ApiResponse::success("Open positions", position_catalog()))
}

/// Buffer all parts. Text parts become validator fields; the resume part is
/// type-checked before a byte of it is read and size-capped while reading.
async fn read_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(FieldMap, Option<ResumeUpload>), AppError> {
    let mut fields = FieldMap::new();
    let mut resume: Option<ResumeUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == RESUME_FIELD {
            // A file input left empty still posts a part; no filename means
            // nothing was attached.
            let Some(filename) = field
                .file_name()
                .map(str::to_string)
                .filter(|n| !n.is_empty())
            else {
                continue;
            };
            if resume.is_some() {
                return Err(AppError::BadRequest(
                    "form may carry only one resume".to_string(),
                ));
            }
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let ext = state.storage.validate_type(&content_type)?;
            let data = read_capped(field, state.storage.max_bytes()).await?;
            resume = Some(ResumeUpload {
                filename,
                content_type,
                ext,
                data,
            });
        } else {
            fields.insert(name, field.text().await?);
        }
    }

    Ok((fields, resume))
}

async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge {
                size: data.len() + chunk.len(),
                limit,
            }
            .into());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}
