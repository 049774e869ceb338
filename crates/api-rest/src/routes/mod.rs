//! Endpoint handlers, grouped by resource.

pub mod auth;
pub mod doctors;
pub mod mappings;
pub mod patients;

use crate::AppState;
use api_shared::HealthRes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthRes),
        (status = 503, description = "Database unreachable", body = HealthRes),
    )
)]
/// Health check endpoint for the REST API
///
/// Reports whether the service can reach its database. Used for monitoring and load balancer
/// health checks; needs no credentials.
#[axum::debug_handler(state = AppState)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthRes>) {
    let res = state.health.check_health();
    (health_status(&res), Json(res))
}

fn health_status(res: &HealthRes) -> StatusCode {
    if res.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
