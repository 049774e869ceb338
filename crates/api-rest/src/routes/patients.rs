//! Patient endpoints.
//!
//! The list only ever shows the caller's own patients. Single-record endpoints admit the owner
//! and administrators; anyone else gets `404`.

use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthCaller, RecordPath};
use crate::AppState;
use api_shared::{ErrorRes, PatientPatchReq, PatientReq, PatientRes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use caremap_core::{PatientChanges, PatientFields};

fn fields(req: PatientReq) -> PatientFields {
    PatientFields {
        name: req.name,
        age: req.age,
        gender: req.gender,
        address: req.address,
    }
}

#[utoipa::path(
    get,
    path = "/api/patients/",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's patients, newest first", body = [PatientRes]),
        (status = 401, description = "Not authenticated", body = ErrorRes),
    )
)]
/// List the caller's patients
#[axum::debug_handler(state = AppState)]
pub async fn list_patients(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Json<Vec<PatientRes>>> {
    let patients = state.store.patients.list(&caller)?;
    Ok(Json(patients.into_iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/patients/",
    request_body = PatientReq,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Patient created", body = PatientRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 401, description = "Not authenticated", body = ErrorRes),
    )
)]
/// Create a patient owned by the caller
///
/// Any `owner` in the body is ignored.
#[axum::debug_handler(state = AppState)]
pub async fn create_patient(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    ApiJson(req): ApiJson<PatientReq>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let patient = state.store.patients.create(&caller, fields(req))?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}/",
    params(("id" = String, Path, description = "Patient id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The patient", body = PatientRes),
        (status = 404, description = "No such patient, or not visible to the caller", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_patient(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    RecordPath(id): RecordPath,
) -> ApiResult<Json<PatientRes>> {
    Ok(Json(state.store.patients.get(&caller, &id)?.into()))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}/",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient replaced", body = PatientRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 404, description = "No such patient, or not visible to the caller", body = ErrorRes),
    )
)]
/// Replace every writable field of a patient
#[axum::debug_handler(state = AppState)]
pub async fn replace_patient(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    RecordPath(id): RecordPath,
    ApiJson(req): ApiJson<PatientReq>,
) -> ApiResult<Json<PatientRes>> {
    let changes = PatientChanges::from(fields(req));
    Ok(Json(state.store.patients.update(&caller, &id, changes)?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/patients/{id}/",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientPatchReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient updated", body = PatientRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 404, description = "No such patient, or not visible to the caller", body = ErrorRes),
    )
)]
/// Update only the fields present in the body
#[axum::debug_handler(state = AppState)]
pub async fn patch_patient(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    RecordPath(id): RecordPath,
    ApiJson(req): ApiJson<PatientPatchReq>,
) -> ApiResult<Json<PatientRes>> {
    let changes = PatientChanges {
        name: req.name,
        age: req.age,
        gender: req.gender,
        address: req.address,
    };
    Ok(Json(state.store.patients.update(&caller, &id, changes)?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}/",
    params(("id" = String, Path, description = "Patient id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Patient and its assignments deleted"),
        (status = 404, description = "No such patient, or not visible to the caller", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn delete_patient(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    RecordPath(id): RecordPath,
) -> ApiResult<StatusCode> {
    state.store.patients.delete(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
