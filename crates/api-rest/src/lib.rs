//! # API REST
//!
//! REST API implementation for caremap.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Bearer token authentication
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request/response types and token handling, and `caremap-core` for
//! everything else.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
mod routes;

use api_shared::{dto, HealthService, TokenService, TokenSettings};
use axum::routing::{delete, get, post};
use axum::Router;
use caremap_core::config::{bool_from_env_value, database_path_from_env_value};
use caremap_core::{AssignmentDeletePolicy, CareStore, CoreConfig};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ApiResult};

/// Application state for the REST API server.
///
/// Shared by every handler: the repositories, the token service and the health check.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: CareStore,
    pub tokens: Arc<TokenService>,
    pub health: HealthService,
}

impl AppState {
    pub fn new(store: CareStore, tokens: Arc<TokenService>) -> Self {
        let health = HealthService::new(store.database().clone());
        Self {
            store,
            tokens,
            health,
        }
    }
}

/// Resolves configuration from the process environment and opens the store.
///
/// # Environment Variables
/// - `CAREMAP_DATABASE`: SQLite database file (default: "caremap.db")
/// - `CAREMAP_JWT_SECRET`: token signing secret, at least 32 bytes (required)
/// - `CAREMAP_ACCESS_TOKEN_MINUTES`: access token lifetime (default: 5)
/// - `CAREMAP_REFRESH_TOKEN_HOURS`: refresh token lifetime (default: 24)
/// - `CAREMAP_ADMIN_DELETES_ANY_ASSIGNMENT`: let administrators delete any assignment
///   (default: false)
///
/// # Errors
/// Returns an error if a variable is malformed, the secret is missing or too short, or the
/// database cannot be opened.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let database_path = database_path_from_env_value(std::env::var("CAREMAP_DATABASE").ok());
    let admin_deletes_any = bool_from_env_value(
        "CAREMAP_ADMIN_DELETES_ANY_ASSIGNMENT",
        std::env::var("CAREMAP_ADMIN_DELETES_ANY_ASSIGNMENT").ok(),
        false,
    )?;
    let cfg = Arc::new(CoreConfig::new(
        database_path,
        AssignmentDeletePolicy::from_admin_flag(admin_deletes_any),
    )?);

    let settings = TokenSettings::from_env_values(
        std::env::var("CAREMAP_JWT_SECRET").ok(),
        std::env::var("CAREMAP_ACCESS_TOKEN_MINUTES").ok(),
        std::env::var("CAREMAP_REFRESH_TOKEN_HOURS").ok(),
    )?;

    tracing::info!("-- Using database {}", cfg.database_path().display());
    tracing::info!(
        "-- Access tokens last {} minutes, refresh tokens {} hours",
        settings.access_ttl().num_minutes(),
        settings.refresh_ttl().num_hours()
    );
    let store = CareStore::open(cfg)?;
    Ok(AppState::new(store, Arc::new(TokenService::new(&settings))))
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::refresh,
        routes::patients::list_patients,
        routes::patients::create_patient,
        routes::patients::get_patient,
        routes::patients::replace_patient,
        routes::patients::patch_patient,
        routes::patients::delete_patient,
        routes::doctors::list_doctors,
        routes::doctors::create_doctor,
        routes::doctors::get_doctor,
        routes::doctors::replace_doctor,
        routes::doctors::patch_doctor,
        routes::doctors::delete_doctor,
        routes::mappings::list_mappings,
        routes::mappings::create_mapping,
        routes::mappings::list_patient_mappings,
        routes::mappings::delete_mapping,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::RegisterReq,
        dto::UserRes,
        dto::LoginReq,
        dto::TokenPairRes,
        dto::RefreshReq,
        dto::AccessTokenRes,
        dto::PatientReq,
        dto::PatientPatchReq,
        dto::PatientRes,
        dto::DoctorReq,
        dto::DoctorPatchReq,
        dto::DoctorRes,
        dto::AssignmentReq,
        dto::AssignmentRes,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Builds the full REST application: API routes, Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/auth/register/", post(routes::auth::register))
        .route("/api/auth/login/", post(routes::auth::login))
        .route("/api/auth/refresh/", post(routes::auth::refresh))
        .route(
            "/api/patients/",
            get(routes::patients::list_patients).post(routes::patients::create_patient),
        )
        .route(
            "/api/patients/:id/",
            get(routes::patients::get_patient)
                .put(routes::patients::replace_patient)
                .patch(routes::patients::patch_patient)
                .delete(routes::patients::delete_patient),
        )
        .route(
            "/api/doctors/",
            get(routes::doctors::list_doctors).post(routes::doctors::create_doctor),
        )
        .route(
            "/api/doctors/:id/",
            get(routes::doctors::get_doctor)
                .put(routes::doctors::replace_doctor)
                .patch(routes::doctors::patch_doctor)
                .delete(routes::doctors::delete_doctor),
        )
        .route(
            "/api/mappings/",
            get(routes::mappings::list_mappings).post(routes::mappings::create_mapping),
        )
        .route(
            "/api/mappings/patient/:id/",
            get(routes::mappings::list_patient_mappings),
        )
        .route(
            "/api/mappings/:id/delete/",
            delete(routes::mappings::delete_mapping),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
