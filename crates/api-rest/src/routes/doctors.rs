//! Doctor directory endpoints. Any authenticated caller may read and write.

use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthCaller, RecordPath};
use crate::AppState;
use api_shared::{DoctorPatchReq, DoctorReq, DoctorRes, ErrorRes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use caremap_core::{DoctorChanges, DoctorFields};

fn fields(req: DoctorReq) -> DoctorFields {
    DoctorFields {
        name: req.name,
        specialty: req.specialty,
        contact_number: req.contact_number,
        email: req.email,
    }
}

#[utoipa::path(
    get,
    path = "/api/doctors/",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All doctors, newest first", body = [DoctorRes]),
        (status = 401, description = "Not authenticated", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_doctors(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
) -> ApiResult<Json<Vec<DoctorRes>>> {
    let doctors = state.store.doctors.list()?;
    Ok(Json(doctors.into_iter().map(DoctorRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/doctors/",
    request_body = DoctorReq,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Doctor created", body = DoctorRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_doctor(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    ApiJson(req): ApiJson<DoctorReq>,
) -> ApiResult<(StatusCode, Json<DoctorRes>)> {
    let doctor = state.store.doctors.create(fields(req))?;
    tracing::debug!("doctor {} added by {}", doctor.id, caller.id());
    Ok((StatusCode::CREATED, Json(doctor.into())))
}

#[utoipa::path(
    get,
    path = "/api/doctors/{id}/",
    params(("id" = String, Path, description = "Doctor id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The doctor", body = DoctorRes),
        (status = 404, description = "No such doctor", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn get_doctor(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
    RecordPath(id): RecordPath,
) -> ApiResult<Json<DoctorRes>> {
    Ok(Json(state.store.doctors.get(&id)?.into()))
}

#[utoipa::path(
    put,
    path = "/api/doctors/{id}/",
    params(("id" = String, Path, description = "Doctor id")),
    request_body = DoctorReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Doctor replaced", body = DoctorRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 404, description = "No such doctor", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn replace_doctor(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
    RecordPath(id): RecordPath,
    ApiJson(req): ApiJson<DoctorReq>,
) -> ApiResult<Json<DoctorRes>> {
    let changes = DoctorChanges::from(fields(req));
    Ok(Json(state.store.doctors.update(&id, changes)?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/doctors/{id}/",
    params(("id" = String, Path, description = "Doctor id")),
    request_body = DoctorPatchReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Doctor updated", body = DoctorRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 404, description = "No such doctor", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn patch_doctor(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
    RecordPath(id): RecordPath,
    ApiJson(req): ApiJson<DoctorPatchReq>,
) -> ApiResult<Json<DoctorRes>> {
    let changes = DoctorChanges {
        name: req.name,
        specialty: req.specialty,
        contact_number: req.contact_number,
        email: req.email,
    };
    Ok(Json(state.store.doctors.update(&id, changes)?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/doctors/{id}/",
    params(("id" = String, Path, description = "Doctor id")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Doctor and its assignments deleted"),
        (status = 404, description = "No such doctor", body = ErrorRes),
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn delete_doctor(
    State(state): State<AppState>,
    AuthCaller(_caller): AuthCaller,
    RecordPath(id): RecordPath,
) -> ApiResult<StatusCode> {
    state.store.doctors.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
