//! REST API module for inbound commands and data access
//!
//! Commands arrive already authorized; identity/permission decisions are
//! made upstream. Handlers are thin: parse, call the supervisor, map the
//! error taxonomy to status codes.

pub mod units;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::PageMeta;

/// Common pagination parameters (1-indexed pages)
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: usize,
    /// Maximum number of items to return (default: 50, max: 500)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    50
}

impl PaginationParams {
    pub fn normalized_limit(&self) -> usize {
        self.limit.clamp(1, 500)
    }
}

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, page: None }
    }

    pub fn paged(data: T, page: PageMeta) -> Self {
        Self {
            data,
            page: Some(page),
        }
    }
}

/// Maps the error taxonomy onto HTTP status codes
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::ProcessFailure(_) | Error::Io(_) | Error::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let resp = ApiError(Error::unit_not_found("u1")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError(Error::Validation("bad".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError(Error::ProcessFailure("boom".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_limit_is_clamped() {
        let params = PaginationParams { page: 1, limit: 9999 };
        assert_eq!(params.normalized_limit(), 500);
        let params = PaginationParams { page: 1, limit: 0 };
        assert_eq!(params.normalized_limit(), 1);
    }
}
