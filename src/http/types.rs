use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::todo_service::ServiceError;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody { pub error: String }

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageBody { pub message: String }

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthBody {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthBody {
    pub fn current() -> Self {
        Self { status: "healthy".into(), service: "todo-backend".into(), version: env!("CARGO_PKG_VERSION").into() }
    }
}

/// Error returned from handlers. Internal faults carry no detail; the cause is
/// logged when the `ServiceError` is converted.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    TitleRequired,
    InvalidId,
    NotFound,
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::TitleRequired | ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::TitleRequired => "Title required",
            ApiError::InvalidId => "Invalid id",
            ApiError::NotFound => "Not found",
            ApiError::Internal => "Internal server error",
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation => ApiError::TitleRequired,
            ServiceError::NotFound(_) => ApiError::NotFound,
            ServiceError::Storage(cause) => {
                tracing::error!(error = %format!("{cause:#}"), "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), axum::Json(ErrorBody { error: self.message().into() })).into_response()
    }
}
