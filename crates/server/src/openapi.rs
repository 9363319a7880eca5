use utoipa::OpenApi;
use utoipa::ToSchema;

use crate::errors::ErrorObj;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct VersionDoc { pub version_number: String, pub details: String }

#[derive(ToSchema)]
pub struct ServiceDoc {
    pub id: String,
    pub name: String,
    pub description: String,
    pub versions: Vec<VersionDoc>,
    /// ISO-8601 UTC with milliseconds
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct CreateServiceDoc {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub versions: Vec<VersionDoc>,
}

#[derive(ToSchema)]
pub struct UpdateServiceDoc {
    /// Must be absent or empty; renames are rejected.
    pub name: Option<String>,
    pub description: Option<String>,
    /// Appended to the existing versions.
    pub versions: Option<Vec<VersionDoc>>,
}

#[derive(ToSchema)]
pub struct ServiceListDataDoc {
    pub count: u64,
    pub services: Vec<ServiceDoc>,
    pub next: Option<String>,
}

#[derive(ToSchema)]
pub struct ServiceListResponseDoc { pub success: bool, pub data: ServiceListDataDoc }

#[derive(ToSchema)]
pub struct ServiceResponseDoc { pub success: bool, pub data: ServiceDoc }

#[derive(ToSchema)]
pub struct EmptyResponseDoc { pub success: bool }

#[derive(ToSchema)]
pub struct ErrorResponseDoc { pub success: bool, pub errors: Vec<ErrorObj> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::services::search,
        crate::routes::services::get_by_id,
        crate::routes::services::create,
        crate::routes::services::update,
        crate::routes::services::delete,
    ),
    components(
        schemas(
            HealthResponse,
            VersionDoc,
            ServiceDoc,
            CreateServiceDoc,
            UpdateServiceDoc,
            ServiceListDataDoc,
            ServiceListResponseDoc,
            ServiceResponseDoc,
            EmptyResponseDoc,
            ErrorResponseDoc,
            ErrorObj,
        )
    ),
    tags(
        (name = "health"),
        (name = "services")
    )
)]
pub struct ApiDoc;
