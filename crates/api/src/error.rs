//! Conversion of application errors into HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cashtrackr_core::{account::AccountError, budget::BudgetError};
use cashtrackr_shared::AppError;
use serde_json::json;
use tracing::{error, warn};

/// Message returned for every 500-class failure.
pub const GENERIC_ERROR: &str = "Hubo un error";

/// Result type for handlers and extractors.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by handlers and pipeline stages.
///
/// Single errors render as `{"error": msg}`, field validation as
/// `{"errors": [...]}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        Self(error.into())
    }
}

impl From<BudgetError> for ApiError {
    fn from(error: BudgetError) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.0 {
            AppError::Validation(errors) => {
                (status, Json(json!({ "errors": errors }))).into_response()
            }
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::TooManyRequests(msg) => {
                (status, Json(json!({ "error": msg }))).into_response()
            }
            e => {
                error!(code = e.error_code(), error = %e, "Request failed");
                (status, Json(json!({ "error": GENERIC_ERROR }))).into_response()
            }
        }
    }
}

/// Logs a rejected credential and wraps it.
pub(crate) fn unauthorized(msg: &str) -> ApiError {
    warn!(reason = msg, "Rejected credential");
    ApiError(AppError::Unauthorized(msg.to_string()))
}
