//! Request extractors: bearer authentication, JSON bodies and record ids.

use crate::error::ApiError;
use crate::AppState;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use caremap_core::{Caller, RecordId};

/// The authenticated caller, resolved from an `Authorization: Bearer <access>` header.
///
/// The administrative flag comes from the identity store, not from the token.
#[derive(Clone, Debug)]
pub struct AuthCaller(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for AuthCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthenticated("authentication credentials were not provided"))?;

        let token = match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => return Err(ApiError::unauthenticated("expected a bearer token")),
        };

        let claims = state.tokens.verify_access(token)?;
        let id = RecordId::parse(&claims.sub)
            .map_err(|_| ApiError::unauthenticated("token is invalid"))?;

        Ok(AuthCaller(state.store.caller(&id)?))
    }
}

/// `axum::Json` whose rejections render as validation errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// A record id taken from the path. Anything that is not a canonical id is `404`.
#[derive(Clone, Debug)]
pub struct RecordPath(pub RecordId);

#[async_trait]
impl<S> FromRequestParts<S> for RecordPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found())?;
        RecordId::parse(&raw)
            .map(RecordPath)
            .map_err(|_| ApiError::not_found())
    }
}

/// Parses an id supplied in a request body; a malformed id is a validation error on `field`.
pub fn body_id(field: &str, raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw.trim()).map_err(|_| ApiError::validation(format!("{field}: invalid id")))
}
