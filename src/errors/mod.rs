//! Unified error handling and the JSON response envelope.
//!
//! Every response carries `{status, message, data?, errors?, timestamp}`.
//! Validation failure is an expected outcome and travels as per-field
//! errors with a 400; store failures are system problems and map to 5xx
//! with the cause logged, never leaked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DbError;

/// A single field-level validation error.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T, message: &str) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.to_string(),
            data: Some(data),
            errors: None,
            timestamp: Utc::now(),
        })
    }

    /// Wrap a failure in the envelope.
    pub fn error(message: &str, errors: Option<Vec<FieldError>>) -> Json<Self> {
        Json(Self {
            status: "error",
            message: message.to_string(),
            data: None,
            errors,
            timestamp: Utc::now(),
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Invalid input data".to_string(),
                Some(errors),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::Db(DbError::AcquisitionTimeout(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database is busy, try again shortly".to_string(),
                None,
            ),
            AppError::Db(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        (status, ApiResponse::<()>::error(&message, errors)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_envelope() {
        let response = ApiResponse::success("hello", "done");
        let json = serde_json::to_value(&response.0).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "done");
        assert_eq!(json["data"], "hello");
        assert!(json.get("errors").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn api_response_error_envelope_with_fields() {
        let errors = vec![FieldError::new("cpf", "invalid CPF")];
        let response = ApiResponse::<()>::error("Invalid input data", Some(errors));
        let json = serde_json::to_value(&response.0).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("data").is_none());
        assert_eq!(json["errors"][0]["field"], "cpf");
        assert_eq!(json["errors"][0]["message"], "invalid CPF");
    }

    #[test]
    fn api_response_error_envelope_omits_empty_errors() {
        let response = ApiResponse::<()>::error("nope", None);
        let json = serde_json::to_value(&response.0).unwrap();
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn app_error_display() {
        let err = AppError::NotFound("person 42".to_string());
        assert_eq!(err.to_string(), "not found: person 42");
    }

    #[test]
    fn app_error_from_db_error() {
        let err: AppError = DbError::Query(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, AppError::Db(_)));
    }
}
