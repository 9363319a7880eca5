use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ModelError;

/// Index holding catalog services.
pub const SERVICE_INDEX: &str = "services";
/// Field every listing is sorted by, newest first.
pub const UPDATED_AT_FIELD: &str = "updated_at";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub details: String,
}

/// A catalog entry as stored in the search index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<Version>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    pub fn from_document(doc: Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(doc)?)
    }

    pub fn to_document(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Mark the entity as written at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Versions are append-only; existing entries are never replaced.
    pub fn append_versions(&mut self, versions: impl IntoIterator<Item = Version>) {
        self.versions.extend(versions);
    }
}

/// Creation input. `id` and `created_at` are optional and filled by the server.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NewService {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewService {
    pub fn parse(line: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(line)?)
    }

    /// Assign an id when missing or blank, keep a supplied `created_at`, stamp `updated_at`.
    pub fn into_service(self, now: DateTime<Utc>) -> Service {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Service {
            id,
            name: self.name,
            description: self.description,
            versions: self.versions,
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        }
    }
}
