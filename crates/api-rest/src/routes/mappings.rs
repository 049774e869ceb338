//! Patient–doctor assignment endpoints.

use crate::error::ApiResult;
use crate::extract::{body_id, ApiJson, AuthCaller, RecordPath};
use crate::AppState;
use api_shared::{AssignmentReq, AssignmentRes, ErrorRes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/mappings/",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Assignments visible to the caller, newest first", body = [AssignmentRes]),
        (status = 401, description = "Not authenticated", body = ErrorRes),
    )
)]
/// List assignments
///
/// Administrators see every assignment; everyone else sees those of their own patients.
#[axum::debug_handler(state = AppState)]
pub async fn list_mappings(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Json<Vec<AssignmentRes>>> {
    let assignments = state.store.assignments.list(&caller)?;
    Ok(Json(assignments.into_iter().map(AssignmentRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/mappings/",
    request_body = AssignmentReq,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Doctor assigned", body = AssignmentRes),
        (status = 400, description = "Unknown or foreign patient, unknown doctor, or duplicate", body = ErrorRes),
    )
)]
/// Assign a doctor to a patient
#[axum::debug_handler(state = AppState)]
pub async fn create_mapping(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    ApiJson(req): ApiJson<AssignmentReq>,
) -> ApiResult<(StatusCode, Json<AssignmentRes>)> {
    let patient_id = body_id("patient", &req.patient)?;
    let doctor_id = body_id("doctor", &req.doctor)?;
    let assignment = state
        .store
        .assignments
        .create(&caller, &patient_id, &doctor_id)?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

#[utoipa::path(
    get,
    path = "/api/mappings/patient/{id}/",
    params(("id" = String, Path, description = "Patient id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Assignments of the patient", body = [AssignmentRes]),
        (status = 404, description = "No such patient, or not visible to the caller", body = ErrorRes),
    )
)]
/// List the doctors assigned to one patient
#[axum::debug_handler(state = AppState)]
pub async fn list_patient_mappings(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    RecordPath(patient_id): RecordPath,
) -> ApiResult<Json<Vec<AssignmentRes>>> {
    let assignments = state
        .store
        .assignments
        .list_for_patient(&caller, &patient_id)?;
    Ok(Json(assignments.into_iter().map(AssignmentRes::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/mappings/{id}/delete/",
    params(("id" = String, Path, description = "Assignment id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 404, description = "No such assignment, or not deletable by the caller", body = ErrorRes),
    )
)]
/// Remove an assignment
#[axum::debug_handler(state = AppState)]
pub async fn delete_mapping(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    RecordPath(id): RecordPath,
) -> ApiResult<StatusCode> {
    state.store.assignments.delete(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
