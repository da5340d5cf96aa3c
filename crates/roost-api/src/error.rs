use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use roost_types::api::{FullMessages, PlainErrors, RegistrationErrors};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 422 with devise-style `errors.full_messages`.
    #[error("unprocessable: {0:?}")]
    Unprocessable(Vec<String>),

    /// 400 with a plain `errors` array. The ownership-gated delete path
    /// deliberately sends an empty set here.
    #[error("bad request: {0:?}")]
    BadRequest(Vec<String>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(vec![message.into()])
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(vec![message.into()])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unprocessable(full_messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(RegistrationErrors {
                    errors: FullMessages { full_messages },
                }),
            )
                .into_response(),
            ApiError::BadRequest(errors) => {
                (StatusCode::BAD_REQUEST, Json(PlainErrors { errors })).into_response()
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(PlainErrors {
                    errors: vec!["You need to sign in or sign up before continuing.".into()],
                }),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(PlainErrors {
                    errors: vec!["Not found".into()],
                }),
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(PlainErrors {
                        errors: vec!["Internal server error".into()],
                    }),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
