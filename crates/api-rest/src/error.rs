//! Mapping from core and token errors to HTTP responses.

use api_shared::{ErrorRes, TokenError};
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use caremap_core::CareError;

/// An error ready to be rendered as `{"error": kind, "message": text}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "validation",
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "unauthenticated",
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: "not found".into(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: "internal error".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CareError> for ApiError {
    fn from(err: CareError) -> Self {
        match err {
            CareError::Validation(message) => Self::validation(message),
            CareError::NotFound => Self::not_found(),
            CareError::Forbidden => Self {
                status: StatusCode::FORBIDDEN,
                kind: "forbidden",
                message: "you do not have permission to perform this action".into(),
            },
            CareError::Unauthenticated => {
                Self::unauthenticated("authentication credentials were not provided or are invalid")
            }
            other => {
                tracing::error!("request failed: {other:?}");
                Self::internal()
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::unauthenticated("token has expired"),
            TokenError::Invalid | TokenError::WrongType { .. } => {
                Self::unauthenticated("token is invalid")
            }
            other => {
                tracing::error!("token handling failed: {other:?}");
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorRes {
            error: self.kind.to_string(),
            message: self.message,
        });
        if self.status == StatusCode::UNAUTHORIZED {
            (self.status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (self.status, body).into_response()
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
