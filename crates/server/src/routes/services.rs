use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use service::catalog::{CreateServiceRequest, ServiceDto, UpdateServiceRequest};
use service::Page;
use tracing::{error, info};

use crate::errors::{ApiError, ApiResponse};
use crate::routes::AppState;
use crate::validator;

const DEFAULT_PAGE: &str = "1";
const DEFAULT_LIMIT: &str = "10";

#[derive(Debug, Default, PartialEq, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Exact phrase matched against name and description; empty lists everything.
    pub q: Option<String>,
    /// 1-based page, default 1
    pub page: Option<String>,
    /// Page size, default 10
    pub limit: Option<String>,
}

impl SearchParams {
    /// Read from the raw query string. The first occurrence of a repeated key wins and
    /// unknown keys are ignored, so no query string is ever rejected here.
    pub fn from_query(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        for (k, v) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match k.as_ref() {
                "q" => &mut params.q,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(v.into_owned());
            }
        }
        params
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceListData {
    pub count: u64,
    pub services: Vec<ServiceDto>,
    pub next: Option<String>,
}

type Detail = (StatusCode, Json<ApiResponse<ServiceDto>>);

/// Link to the following page: the request's own query with `page`, `limit` and a non-empty
/// `q` overwritten, keys sorted. `None` once `page * limit` reaches `total`.
pub fn next_page_url(path: &str, raw_query: Option<&str>, query: &str, page: Page, total: u64) -> Option<String> {
    if !page.has_next(total) {
        return None;
    }
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in url::form_urlencoded::parse(raw_query.unwrap_or_default().as_bytes()) {
        params.entry(k.into_owned()).or_default().push(v.into_owned());
    }
    let next = page.next();
    params.insert("page".into(), vec![next.page.to_string()]);
    params.insert("limit".into(), vec![next.limit.to_string()]);
    if !query.is_empty() {
        params.insert("q".into(), vec![query.to_string()]);
    }

    let mut encoded = url::form_urlencoded::Serializer::new(String::new());
    for (k, values) in &params {
        for v in values {
            encoded.append_pair(k, v);
        }
    }
    Some(format!("{}?{}", path, encoded.finish()))
}

#[utoipa::path(
    get, path = "/api/services", tag = "services",
    params(SearchParams),
    responses(
        (status = 200, description = "Page of services", body = crate::openapi::ServiceListResponseDoc),
        (status = 400, description = "Invalid page or limit", body = crate::openapi::ErrorResponseDoc),
        (status = 500, description = "Search failed", body = crate::openapi::ErrorResponseDoc)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ApiResponse<ServiceListData>>, ApiError> {
    let params = SearchParams::from_query(uri.query());
    let query = params.q.unwrap_or_default();
    let page_raw = params.page.as_deref().unwrap_or(DEFAULT_PAGE);
    let limit_raw = params.limit.as_deref().unwrap_or(DEFAULT_LIMIT);
    info!(%query, page = %page_raw, limit = %limit_raw, "searching services");

    let page = validator::validate_search_request(page_raw, limit_raw)?;
    let result = state.catalog.search(&query, page).await.map_err(|e| {
        error!(error = %e, "failed to search services");
        ApiError::internal("service", "search failed")
    })?;

    let next = next_page_url(uri.path(), uri.query(), &query, page, result.total);
    Ok(Json(ApiResponse::ok(ServiceListData { count: result.total, services: result.services, next })))
}

#[utoipa::path(
    get, path = "/api/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service found", body = crate::openapi::ServiceResponseDoc),
        (status = 404, description = "No such service", body = crate::openapi::ErrorResponseDoc),
        (status = 500, description = "Lookup failed", body = crate::openapi::ErrorResponseDoc)
    )
)]
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> Result<Detail, ApiError> {
    info!(%id, "fetching service");
    validator::validate_id(&id)?;
    let svc = state
        .catalog
        .find_by_id(&id)
        .await
        .map_err(|e| ApiError::from_service(e, "failed to fetch service"))?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(svc))))
}

#[utoipa::path(
    post, path = "/api/services", tag = "services",
    request_body = crate::openapi::CreateServiceDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::ServiceResponseDoc),
        (status = 400, description = "Malformed body or validation error", body = crate::openapi::ErrorResponseDoc),
        (status = 409, description = "A service with this id already exists", body = crate::openapi::ErrorResponseDoc),
        (status = 500, description = "Create failed", body = crate::openapi::ErrorResponseDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> Result<Detail, ApiError> {
    let Json(req) = payload.map_err(|e| {
        error!(error = %e, "invalid request body");
        ApiError::malformed("service", "invalid request body")
    })?;
    validator::validate_create_request(&req)?;

    let created = state
        .catalog
        .create(req)
        .await
        .map_err(|e| ApiError::from_service(e, "failed to create service"))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

#[utoipa::path(
    put, path = "/api/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    request_body = crate::openapi::UpdateServiceDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::ServiceResponseDoc),
        (status = 400, description = "Malformed body, rename attempt or bad version", body = crate::openapi::ErrorResponseDoc),
        (status = 404, description = "No such service", body = crate::openapi::ErrorResponseDoc),
        (status = 500, description = "Update failed", body = crate::openapi::ErrorResponseDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateServiceRequest>, JsonRejection>,
) -> Result<Detail, ApiError> {
    validator::validate_id(&id)?;
    let Json(req) = payload.map_err(|e| {
        error!(error = %e, %id, "invalid request body");
        ApiError::malformed("service", "invalid request body")
    })?;
    validator::validate_update_request(&req)?;

    let updated = state
        .catalog
        .update(&id, req)
        .await
        .map_err(|e| ApiError::from_service(e, "failed to update service"))?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(updated))))
}

#[utoipa::path(
    delete, path = "/api/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::EmptyResponseDoc),
        (status = 404, description = "No such service", body = crate::openapi::ErrorResponseDoc),
        (status = 500, description = "Delete failed", body = crate::openapi::ErrorResponseDoc)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validator::validate_id(&id)?;
    state
        .catalog
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_service(e, "failed to delete service"))?;
    Ok(Json(ApiResponse::empty()))
}
