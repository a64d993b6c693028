//! Actix Web error adapters for Fleet Sentinel errors.
//!
//! Every error reaches the client as `{"error": ..., "code": ...}`.

use crate::error::Error;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

fn json_error(message: String, status_code: StatusCode) -> HttpResponse {
    HttpResponse::build(status_code)
        .content_type("application/json")
        .json(json!({
            "error": message,
            "code": status_code.as_u16()
        }))
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        json_error(self.to_string(), self.status_code())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::UnknownResourceType(_) => StatusCode::BAD_REQUEST,
            Error::ConfigInvalid(_) => StatusCode::BAD_REQUEST,
            Error::ConfigParse(_) => StatusCode::BAD_REQUEST,
            Error::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            Error::ResourceExists(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors raised by the HTTP layer itself
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Sentinel(#[from] Error),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        json_error(self.to_string(), self.status_code())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Sentinel(e) => e.status_code(),
        }
    }
}
