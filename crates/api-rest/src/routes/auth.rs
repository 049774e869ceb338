//! Registration and token endpoints. None of these require credentials.

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;
use api_shared::{
    AccessTokenRes, ErrorRes, LoginReq, RefreshReq, RegisterReq, TokenPairRes, UserRes,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use caremap_core::{RecordId, Registration};

#[utoipa::path(
    post,
    path = "/api/auth/register/",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = UserRes),
        (status = 400, description = "Invalid input or username taken", body = ErrorRes),
    )
)]
/// Register a new, non-administrative account
#[axum::debug_handler(state = AppState)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterReq>,
) -> ApiResult<(StatusCode, Json<UserRes>)> {
    let identity = state.store.identities.register(Registration {
        username: req.username,
        email: req.email,
        first_name: req.first_name,
        password: req.password,
    })?;
    Ok((StatusCode::CREATED, Json(identity.into())))
}

#[utoipa::path(
    post,
    path = "/api/auth/login/",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPairRes),
        (status = 401, description = "Bad credentials", body = ErrorRes),
    )
)]
/// Exchange a username and password for an access/refresh token pair
#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginReq>,
) -> ApiResult<Json<TokenPairRes>> {
    let identity = state
        .store
        .identities
        .authenticate(&req.username, &req.password)
        .map_err(|e| {
            tracing::info!("failed login for '{}'", req.username);
            ApiError::from(e)
        })?;

    let pair = state.tokens.issue_pair(&identity)?;
    tracing::info!("issued tokens for '{}'", identity.username);
    Ok(Json(TokenPairRes {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh/",
    request_body = RefreshReq,
    responses(
        (status = 200, description = "New access token", body = AccessTokenRes),
        (status = 401, description = "Refresh token invalid or expired", body = ErrorRes),
    )
)]
/// Exchange a refresh token for a new access token
///
/// The account named by the token must still exist.
#[axum::debug_handler(state = AppState)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshReq>,
) -> ApiResult<Json<AccessTokenRes>> {
    let (access, claims) = state.tokens.refresh(&req.refresh)?;
    let id = RecordId::parse(&claims.sub)
        .map_err(|_| ApiError::unauthenticated("token is invalid"))?;
    state.store.caller(&id)?;

    Ok(Json(AccessTokenRes { access }))
}
