//! Request validation for the catalog endpoints.
//!
//! Validators collect every violation instead of stopping at the first one, so a client sees
//! all problems with a request at once. Order of the returned errors follows field order.

use axum::http::StatusCode;
use models::Version;
use service::catalog::{CreateServiceRequest, UpdateServiceRequest};
use service::Page;

use crate::errors::{codes, ApiError, ErrorObj};

#[derive(Debug, PartialEq, Eq)]
pub struct ValidationFailure {
    pub status: StatusCode,
    pub errors: Vec<ErrorObj>,
}

impl ValidationFailure {
    fn bad_request(errors: Vec<ErrorObj>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, errors }
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(f: ValidationFailure) -> Self {
        ApiError(f.status, f.errors)
    }
}

fn malformed(entity: &str, cause: impl Into<String>) -> ErrorObj {
    ErrorObj::new(codes::MALFORMED_DATA, entity, cause)
}

/// Decimal integer >= 1 with an optional leading `+`. Surrounding whitespace is not allowed
/// and values beyond `u32::MAX` are rejected.
fn parse_positive(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|v| *v >= 1)
}

fn finish<T>(value: T, errors: Vec<ErrorObj>) -> Result<T, ValidationFailure> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ValidationFailure::bad_request(errors))
    }
}

pub fn validate_search_request(page: &str, limit: &str) -> Result<Page, ValidationFailure> {
    let mut errors = Vec::new();
    let page = parse_positive(page);
    if page.is_none() {
        errors.push(malformed("page", "invalid page"));
    }
    let limit = parse_positive(limit);
    if limit.is_none() {
        errors.push(malformed("limit", "invalid limit"));
    }
    match (page, limit) {
        (Some(page), Some(limit)) => Ok(Page { page, limit }),
        _ => Err(ValidationFailure::bad_request(errors)),
    }
}

pub fn validate_id(id: &str) -> Result<(), ValidationFailure> {
    if id.trim().is_empty() {
        return Err(ValidationFailure::bad_request(vec![malformed("id", "missing id")]));
    }
    Ok(())
}

fn check_versions(versions: &[Version], errors: &mut Vec<ErrorObj>) {
    for (i, v) in versions.iter().enumerate() {
        if v.version_number.trim().is_empty() {
            errors.push(malformed("versions", format!("versions[{i}].version_number is required")));
        }
    }
}

pub fn validate_create_request(req: &CreateServiceRequest) -> Result<(), ValidationFailure> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push(malformed("name", "name is required"));
    }
    if req.versions.is_empty() {
        errors.push(malformed("versions", "at least one version is required"));
    }
    check_versions(&req.versions, &mut errors);
    finish((), errors)
}

pub fn validate_update_request(req: &UpdateServiceRequest) -> Result<(), ValidationFailure> {
    let mut errors = Vec::new();
    if req.name.as_deref().is_some_and(|n| !n.is_empty()) {
        errors.push(malformed("name", "name cannot be updated"));
    }
    if let Some(versions) = &req.versions {
        check_versions(versions, &mut errors);
    }
    finish((), errors)
}
