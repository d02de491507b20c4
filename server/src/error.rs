//! Errors as the HTTP boundary reports them.
//!
//! Every failure leaves the server as the same envelope:
//! `{"error": CODE, "message": text, "details"?: any}`. Storage faults are
//! logged here and reach the client only as a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::model::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON in request body")]
    InvalidJson(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Todo not found")]
    NotFound,

    #[error("Internal server error")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn body(&self) -> ErrorBody {
        let (_, code) = self.status_and_code();
        let details = match self {
            ApiError::InvalidJson(reason) => Some(json!({ "reason": reason })),
            ApiError::Validation(err) => Some(json!({ "field": err.field })),
            ApiError::NotFound | ApiError::Internal(_) => None,
        };
        ErrorBody {
            error: code,
            message: self.to_string(),
            details,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Validation(err) => ApiError::Validation(err),
            other @ (StoreError::Database(_) | StoreError::Migration(_)) => {
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            error!(%cause, "request failed on storage");
        }
        let (status, _) = self.status_and_code();
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_internal_without_leaking() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, ApiError::Internal(_)));

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn validation_envelope_names_the_field() {
        let err = ApiError::from(StoreError::Validation(ValidationError {
            field: "title",
            message: "Title is required".to_string(),
        }));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], "Title is required");
        assert_eq!(body["details"]["field"], "title");
    }

    #[test]
    fn not_found_has_no_details() {
        let body = serde_json::to_value(ApiError::NotFound.body()).unwrap();
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "Todo not found");
        assert!(body.get("details").is_none());
    }
}
