use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::shared::api::ErrorResponse;

use crate::domain::a001_car::service::CarError;
use crate::domain::a002_review::service::ReviewError;

/// Ошибка HTTP-слоя: статус + `{ "success": false, "message": ... }`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Детали пишутся в лог, клиенту уходит общее сообщение
    pub fn internal(error: &anyhow::Error) -> Self {
        tracing::error!(error = %error, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<CarError> for ApiError {
    fn from(e: CarError) -> Self {
        match e {
            CarError::Validation(msg) => Self::bad_request(msg),
            CarError::NotFound => Self::not_found(e.to_string()),
            CarError::Storage(err) => Self::internal(&err),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::Validation(msg) => Self::bad_request(msg),
            ReviewError::Duplicate => Self::bad_request(e.to_string()),
            ReviewError::CarNotFound | ReviewError::NotFound => Self::not_found(e.to_string()),
            ReviewError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            ReviewError::Storage(err) => Self::internal(&err),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::internal(&e)
    }
}
