//! Error types for quake-api
//!
//! Client errors (bad parameters, malformed ids, missing records) answer with
//! a bare status code. Store failures answer 500 with a generic JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::store::{InvalidRecordId, StoreError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Query parameter failed validation (400)
    #[error("Invalid parameter: {0}")]
    Validation(String),

    /// Path id is not a store identifier (400)
    #[error(transparent)]
    InvalidId(#[from] InvalidRecordId),

    /// No record with this code and id (404)
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Store failure or timeout (500)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(_) | ApiError::InvalidId(_) => {
                debug!("Rejected request: {}", self);
                StatusCode::BAD_REQUEST.into_response()
            }
            ApiError::NotFound(_) => {
                debug!("{}", self);
                StatusCode::NOT_FOUND.into_response()
            }
            ApiError::Store(ref err) => {
                error!("Store failure: {}", err);
                let body = Json(json!({
                    "error": {
                        "code": "STORE_ERROR",
                        "message": "Internal server error",
                    }
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
