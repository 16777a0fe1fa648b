use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use warren_slugs::RegistryError;

use crate::model::{ErrorDetail, ErrorResponse};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("request handler panicked")]
    Panic,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::InvalidSlug(_) => StatusCode::BAD_REQUEST,
            AppError::Registry(err) if err.is_invalid_slug() => StatusCode::BAD_REQUEST,
            AppError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Registry(_) | AppError::Panic => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage and encoder details stay in the logs.
        let description = if status.is_server_error() {
            error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            errors: vec![ErrorDetail {
                code: status.as_u16(),
                description,
            }],
        };
        (status, Json(body)).into_response()
    }
}
