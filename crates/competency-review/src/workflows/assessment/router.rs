use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::EmployeeId;
use super::repository::{EmployeeRepository, RepositoryError};
use super::service::{AssessmentService, AssessmentServiceError};
use crate::workflows::import::{ImportBatchId, RawRow, StagingError};

/// Router builder exposing employee submission, bulk import, and reporting endpoints.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: EmployeeRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/employees",
            post(submit_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/employees/delete", post(delete_handler::<R>))
        .route("/api/v1/employees/preview", post(preview_handler::<R>))
        .route("/api/v1/employees/export", get(export_handler::<R>))
        .route(
            "/api/v1/employees/reclassify",
            post(reclassify_handler::<R>),
        )
        .route("/api/v1/imports", post(stage_import_handler::<R>))
        .route(
            "/api/v1/imports/:batch_id/rejected",
            get(rejected_rows_handler::<R>),
        )
        .route(
            "/api/v1/imports/:batch_id/confirm",
            post(confirm_import_handler::<R>),
        )
        .route(
            "/api/v1/imports/:batch_id",
            delete(discard_import_handler::<R>).get(staged_import_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteRequest {
    ids: Vec<EmployeeId>,
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    axum::Json(row): axum::Json<RawRow>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    match service.submit(row) {
        Ok(outcome) => (StatusCode::CREATED, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<AssessmentService<R>>>) -> Response
where
    R: EmployeeRepository + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    axum::Json(request): axum::Json<DeleteRequest>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    match service.delete(&request.ids) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    axum::Json(row): axum::Json<RawRow>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    match service.preview(&row) {
        Ok(classification) => (StatusCode::OK, axum::Json(classification)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R>(State(service): State<Arc<AssessmentService<R>>>) -> Response
where
    R: EmployeeRepository + 'static,
{
    let mut buffer = Vec::new();
    match service.export_csv(&mut buffer) {
        Ok(()) => csv_response(buffer, "employees.csv"),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reclassify_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    match service.reclassify() {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stage_import_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    body: String,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    match service.stage_csv(body.as_bytes()) {
        Ok(preview) => (StatusCode::CREATED, axum::Json(preview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn staged_import_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(batch_id): Path<String>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    let Some(batch_id) = parse_batch_id(&batch_id) else {
        return unknown_batch(&batch_id);
    };
    match service.staged(batch_id) {
        Ok(preview) => (StatusCode::OK, axum::Json(preview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rejected_rows_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(batch_id): Path<String>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    let Some(parsed) = parse_batch_id(&batch_id) else {
        return unknown_batch(&batch_id);
    };
    let mut buffer = Vec::new();
    match service.write_rejected_csv(parsed, &mut buffer) {
        Ok(()) => csv_response(buffer, &format!("rejected-{}.csv", parsed)),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_import_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(batch_id): Path<String>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    let Some(batch_id) = parse_batch_id(&batch_id) else {
        return unknown_batch(&batch_id);
    };
    match service.confirm_import(batch_id) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn discard_import_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    Path(batch_id): Path<String>,
) -> Response
where
    R: EmployeeRepository + 'static,
{
    let Some(batch_id) = parse_batch_id(&batch_id) else {
        return unknown_batch(&batch_id);
    };
    match service.discard_import(batch_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn parse_batch_id(raw: &str) -> Option<ImportBatchId> {
    raw.parse().ok()
}

fn unknown_batch(raw: &str) -> Response {
    let payload = json!({
        "error": format!("import batch {} not found", raw),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn csv_response(body: Vec<u8>, filename: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// HTTP status for a service error; shared with `AppError`.
pub(crate) fn status_for(error: &AssessmentServiceError) -> StatusCode {
    match error {
        AssessmentServiceError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AssessmentServiceError::Persistence {
            source: RepositoryError::Conflict(_),
            ..
        } => StatusCode::CONFLICT,
        AssessmentServiceError::Staging(StagingError::NotFound(_)) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Staging(StagingError::Expired(_)) => StatusCode::GONE,
        AssessmentServiceError::Import(_) => StatusCode::BAD_REQUEST,
        AssessmentServiceError::Persistence { .. } | AssessmentServiceError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: AssessmentServiceError) -> Response {
    let status = status_for(&error);

    let payload = match &error {
        AssessmentServiceError::Rejected { reasons } => json!({
            "error": "submission rejected",
            "reasons": reasons,
        }),
        other => json!({
            "error": other.to_string(),
        }),
    };

    (status, axum::Json(payload)).into_response()
}
