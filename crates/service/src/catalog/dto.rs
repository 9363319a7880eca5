use chrono::{DateTime, Utc};
use models::{NewService, Service, Version};
use serde::{Deserialize, Serialize};

/// ISO-8601, UTC, millisecond precision: `2024-05-01T10:00:00.000Z`
pub const ISO8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(ISO8601_FORMAT).to_string()
}

/// Service as returned to API clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub versions: Vec<Version>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Service> for ServiceDto {
    fn from(svc: Service) -> Self {
        Self {
            created_at: format_timestamp(&svc.created_at),
            updated_at: format_timestamp(&svc.updated_at),
            id: svc.id,
            name: svc.name,
            description: svc.description,
            versions: svc.versions,
        }
    }
}

/// Body of `POST /api/services`. Missing fields decode to empty so validation can report them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<Version>,
}

impl From<CreateServiceRequest> for NewService {
    fn from(req: CreateServiceRequest) -> Self {
        NewService {
            id: req.id,
            name: req.name,
            description: req.description,
            versions: req.versions,
            created_at: None,
        }
    }
}

/// Body of `PUT /api/services/:id`. Every field is optional; `name` is only accepted
/// so that rename attempts can be rejected explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServiceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<Version>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    pub services: Vec<ServiceDto>,
    pub total: u64,
}
