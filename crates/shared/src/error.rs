//! Application-wide error types.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Where a rejected field was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLocation {
    /// JSON request body.
    Body,
    /// Route path parameter.
    Params,
}

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Always `"field"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// The offending value as received (empty string when absent).
    pub value: Value,
    /// Human readable message.
    pub msg: String,
    /// Field or parameter name.
    pub path: String,
    /// Where the value came from.
    pub location: FieldLocation,
}

impl FieldError {
    /// Creates a field error for a body field.
    #[must_use]
    pub fn body(path: &str, value: Value, msg: &str) -> Self {
        Self::new(path, value, msg, FieldLocation::Body)
    }

    /// Creates a field error for a path parameter.
    #[must_use]
    pub fn param(path: &str, value: &str, msg: &str) -> Self {
        Self::new(path, Value::String(value.to_string()), msg, FieldLocation::Params)
    }

    fn new(path: &str, value: Value, msg: &str, location: FieldLocation) -> Self {
        Self {
            kind: "field",
            value,
            msg: msg.to_string(),
            path: path.to_string(),
            location,
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more request fields failed validation.
    #[error("Validation error: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),

    /// Missing or invalid credential, or ownership mismatch.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Valid credential but the action is not allowed.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request budget for the current window is exhausted.
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::TooManyRequests(_) => 429,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for 500-class errors whose detail must not reach the client.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(AppError::Validation(Vec::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
    #[case(AppError::Forbidden(String::new()), 403, "FORBIDDEN")]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::TooManyRequests(String::new()), 429, "TOO_MANY_REQUESTS")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::ExternalService(String::new()), 500, "EXTERNAL_SERVICE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_error_status_and_code(
        #[case] error: AppError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
        assert_eq!(error.is_internal(), status >= 500);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Unauthorized("msg".into()).to_string(),
            "Authentication failed: msg"
        );
        assert_eq!(
            AppError::Validation(vec![FieldError::body("name", json!(""), "x")]).to_string(),
            "Validation error: 1 field(s) rejected"
        );
    }

    #[test]
    fn test_field_error_serializes_like_validator_output() {
        let error = FieldError::param("budgetId", "abc", "ID no válido");

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "type": "field",
                "value": "abc",
                "msg": "ID no válido",
                "path": "budgetId",
                "location": "params"
            })
        );
    }
}
