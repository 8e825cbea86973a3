use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    AbsenceId, AbsenceReport, CoverRequestId, CoverResponse, EmployeeId, ReplacementCandidate,
};
use super::repository::{CoverNotifier, RepositoryError, SchedulingRepository, StaffDirectory};
use super::scoring::rank_candidates;
use super::service::{CoverServiceError, ShiftCoverService};

/// Router builder exposing the shift-cover HTTP endpoints.
pub fn scheduling_router<R, D, N>(service: Arc<ShiftCoverService<R, D, N>>) -> Router
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/scheduling/absences",
            post(report_handler::<R, D, N>),
        )
        .route(
            "/api/v1/scheduling/absences/:absence_id",
            get(status_handler::<R, D, N>),
        )
        .route(
            "/api/v1/scheduling/absences/:absence_id/cancel",
            post(cancel_handler::<R, D, N>),
        )
        .route(
            "/api/v1/scheduling/cover-requests/:cover_request_id/response",
            post(respond_handler::<R, D, N>),
        )
        .route(
            "/api/v1/scheduling/employees/:employee_id/cover-requests",
            get(inbox_handler::<R, D, N>),
        )
        .route("/api/v1/scheduling/candidates/rank", post(rank_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoverResponsePayload {
    pub(crate) response: CoverResponse,
}

pub(crate) async fn report_handler<R, D, N>(
    State(service): State<Arc<ShiftCoverService<R, D, N>>>,
    axum::Json(report): axum::Json<AbsenceReport>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    match service.report_absence(report, Utc::now()) {
        Ok(receipt) => (StatusCode::ACCEPTED, axum::Json(receipt)).into_response(),
        Err(CoverServiceError::Repository(RepositoryError::Unavailable(detail))) => {
            let payload = json!({
                "error": format!("store unavailable: {detail}"),
                "retryable": true,
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn respond_handler<R, D, N>(
    State(service): State<Arc<ShiftCoverService<R, D, N>>>,
    Path(cover_request_id): Path<String>,
    axum::Json(payload): axum::Json<CoverResponsePayload>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    let id = CoverRequestId(cover_request_id);
    match service.respond_to_cover_request(&id, payload.response, Utc::now()) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(
            error @ (CoverServiceError::AbsenceAlreadyResolved { .. }
            | CoverServiceError::CoverRequestAlreadySettled { .. }),
        ) => {
            let payload = json!({
                "success": false,
                "message": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(
            error @ (CoverServiceError::CoverRequestNotFound(_)
            | CoverServiceError::AbsenceNotFound(_)),
        ) => {
            let payload = json!({
                "success": false,
                "message": error.to_string(),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(CoverServiceError::Repository(RepositoryError::Unavailable(detail))) => {
            let payload = json!({
                "success": false,
                "message": format!("store unavailable: {detail}"),
                "retryable": true,
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "success": false,
                "message": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<R, D, N>(
    State(service): State<Arc<ShiftCoverService<R, D, N>>>,
    Path(absence_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    let id = AbsenceId(absence_id);
    match service.coverage_status(&id, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(CoverServiceError::AbsenceNotFound(_)) => {
            let payload = json!({
                "error": format!("absence {} not found", id),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn cancel_handler<R, D, N>(
    State(service): State<Arc<ShiftCoverService<R, D, N>>>,
    Path(absence_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    let id = AbsenceId(absence_id);
    match service.cancel_absence(&id, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error @ CoverServiceError::AbsenceAlreadyResolved { .. }) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(CoverServiceError::AbsenceNotFound(_)) => {
            let payload = json!({
                "error": format!("absence {} not found", id),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn inbox_handler<R, D, N>(
    State(service): State<Arc<ShiftCoverService<R, D, N>>>,
    Path(employee_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    let id = EmployeeId(employee_id);
    match service.employee_inbox(&id) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// The pure ranking heuristic, exposed for manual-override tooling in the
/// admin dashboard.
pub(crate) async fn rank_handler(
    axum::Json(candidates): axum::Json<Vec<ReplacementCandidate>>,
) -> Response {
    let ranked = rank_candidates(candidates);
    (StatusCode::OK, axum::Json(ranked)).into_response()
}
