//! Admin surface: list, inspect and progress submissions.
//!
//! Mounted only when an admin API key is configured; every route sits behind
//! the Bearer check. Reads run under the privileged credential, so this
//! router must never be reachable without the middleware.

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, Request};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::{
    resolve_sort, CareerStats, ContactStats, PageOf, Pagination, SortDir, CAREER_SORT_COLUMNS,
    CONTACT_SORT_COLUMNS,
};
use crate::error::AppError;
use crate::forms::{ApplicationStatus, CareerRow, ContactRow};
use crate::http::envelope::ApiResponse;
use crate::http::server::AppState;
use crate::validation::FieldError;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/contact", get(list_contacts))
        .route("/contact/stats", get(contact_stats))
        .route("/contact/{id}", get(get_contact))
        .route("/careers", get(list_applications))
        .route("/careers/stats", get(career_stats))
        .route("/careers/{id}", get(get_application))
        .route("/careers/{id}/status", patch(update_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}

/// Bearer-token gate for everything under `/api/admin`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == state.config.admin.api_key => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "admin request without valid credential");
            AppError::Unauthorized.into_response()
        }
    }
}

/// Pagination query parameters, all optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListParams {
    page: u32,
    limit: u32,
    sort: Option<String>,
    dir: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort: None,
            dir: None,
        }
    }
}

fn to_pagination(
    params: &ListParams,
    allowed: &'static [&'static str],
) -> Result<Pagination, AppError> {
    if params.page < 1 {
        return Err(AppError::BadRequest("page must be at least 1".to_string()));
    }
    if !(1..=100).contains(&params.limit) {
        return Err(AppError::BadRequest(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    let sort = resolve_sort(allowed, params.sort.as_deref()).ok_or_else(|| {
        AppError::BadRequest(format!(
            "cannot sort by {:?}",
            params.sort.as_deref().unwrap_or("")
        ))
    })?;
    let dir = match params.dir.as_deref() {
        None => SortDir::Desc,
        Some(raw) => SortDir::parse(raw)
            .ok_or_else(|| AppError::BadRequest("dir must be asc or desc".to_string()))?,
    };
    Ok(Pagination {
        page: params.page,
        limit: params.limit,
        sort,
        dir,
    })
}

pub async fn list_contacts(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<PageOf<ContactRow>>>, AppError> {
    let Query(params) = params?;
    let pagination = to_pagination(&params, CONTACT_SORT_COLUMNS)?;
    let page = state.gateway.list_contacts(&pagination).await?;
    Ok(Json(ApiResponse::success("Contact submissions", page)))
}

pub async fn get_contact(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<ContactRow>>, AppError> {
    let Path(id) = id?;
    let row = state
        .gateway
        .get_contact(id)
        .await?
        .ok_or(AppError::NotFound("Submission"))?;
    Ok(Json(ApiResponse::success("Contact submission", row)))
}

pub async fn contact_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ContactStats>>, AppError> {
    let stats = state.gateway.contact_stats().await?;
    Ok(Json(ApiResponse::success("Contact statistics", stats)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<PageOf<CareerRow>>>, AppError> {
    let Query(params) = params?;
    let pagination = to_pagination(&params, CAREER_SORT_COLUMNS)?;
    let page = state.gateway.list_applications(&pagination).await?;
    Ok(Json(ApiResponse::success("Career applications", page)))
}

pub async fn get_application(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<CareerRow>>, AppError> {
    let Path(id) = id?;
    let row = state
        .gateway
        .get_application(id)
        .await?
        .ok_or(AppError::NotFound("Application"))?;
    Ok(Json(ApiResponse::success("Career application", row)))
}

pub async fn career_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CareerStats>>, AppError> {
    let stats = state.gateway.career_stats().await?;
    Ok(Json(ApiResponse::success("Career statistics", stats)))
}

/// `PATCH /api/admin/careers/{id}/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<CareerRow>>, AppError> {
    let Path(id) = id?;
    let Json(update) = body?;

    let Some(status) = ApplicationStatus::parse(&update.status) else {
        return Err(AppError::Validation(vec![FieldError::new(
            "status",
            "is not a recognized application status",
            Some(&update.status),
        )]));
    };
    let notes = update
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let row = state
        .gateway
        .update_application_status(id, status, notes)
        .await?
        .ok_or(AppError::NotFound("Application"))?;
    tracing::info!(id, status = status.as_str(), "application status updated");
    Ok(Json(ApiResponse::success("Application status updated", row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pagination_is_newest_first() {
        let p = to_pagination(&ListParams::default(), CONTACT_SORT_COLUMNS).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 20);
        assert_eq!(p.sort, "created_at");
        assert_eq!(p.dir, SortDir::Desc);
    }

    #[test]
    fn out_of_range_limit_is_rejected() {
        let params = ListParams {
            limit: 101,
            ..ListParams::default()
        };
        assert!(matches!(
            to_pagination(&params, CONTACT_SORT_COLUMNS),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        let params = ListParams {
            sort: Some("message".to_string()),
            ..ListParams::default()
        };
        assert!(to_pagination(&params, CONTACT_SORT_COLUMNS).is_err());
    }

    #[test]
    fn explicit_sort_and_dir_are_honored() {
        let params = ListParams {
            sort: Some("full_name".to_string()),
            dir: Some("asc".to_string()),
            ..ListParams::default()
        };
        let p = to_pagination(&params, CAREER_SORT_COLUMNS).unwrap();
        assert_eq!(p.sort, "full_name");
        assert_eq!(p.dir, SortDir::Asc);
    }
}
