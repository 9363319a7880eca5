use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use service::ServiceError;
use thiserror::Error;
use tracing::error;

/// Stable error codes carried in `ErrorObj::code`.
pub mod codes {
    pub const MALFORMED_DATA: &str = "MALFORMED_DATA";
    pub const GENERIC_SERVICE_ERROR: &str = "GENERIC_SERVICE_ERROR";
    pub const SERVICE_NOT_FOUND: &str = "SERVICE_NOT_FOUND";
    pub const SERVICE_ALREADY_EXISTS: &str = "SERVICE_ALREADY_EXISTS";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorObj {
    pub code: String,
    pub entity: String,
    pub cause: String,
}

impl ErrorObj {
    pub fn new(code: &str, entity: &str, cause: impl Into<String>) -> Self {
        Self { code: code.to_string(), entity: entity.to_string(), cause: cause.into() }
    }
}

/// Envelope shared by every `/api` endpoint. Absent fields are omitted.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObj>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), errors: None }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self { success: true, data: None, errors: None }
    }

    pub fn failure(errors: Vec<ErrorObj>) -> Self {
        Self { success: false, data: None, errors: Some(errors) }
    }
}

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub Vec<ErrorObj>);

impl ApiError {
    pub fn malformed(entity: &str, cause: &str) -> Self {
        Self(StatusCode::BAD_REQUEST, vec![ErrorObj::new(codes::MALFORMED_DATA, entity, cause)])
    }

    pub fn internal(entity: &str, cause: &str) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, vec![ErrorObj::new(codes::GENERIC_SERVICE_ERROR, entity, cause)])
    }

    pub fn not_found(entity: &str, cause: &str) -> Self {
        Self(StatusCode::NOT_FOUND, vec![ErrorObj::new(codes::SERVICE_NOT_FOUND, entity, cause)])
    }

    pub fn conflict(entity: &str, cause: &str) -> Self {
        Self(StatusCode::CONFLICT, vec![ErrorObj::new(codes::SERVICE_ALREADY_EXISTS, entity, cause)])
    }

    /// Map a use-case failure: `NotFound` becomes 404, `Conflict` 409, anything else an
    /// opaque 500 with `cause`.
    pub fn from_service(err: ServiceError, cause: &str) -> Self {
        if err.is_not_found() {
            return Self::not_found("service", "service not found");
        }
        if err.is_conflict() {
            return Self::conflict("id", "service already exists");
        }
        error!(error = %err, "{}", cause);
        Self::internal("service", cause)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(status, errors) = self;
        (status, Json(ApiResponse::failure(errors))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("search client: {0}")]
    Search(#[from] models::SearchError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
