//! Index migrator: creates every index described under a schema directory that does not
//! exist yet. Existing indices are left untouched, so running it twice is a no-op.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use models::{IndexCreation, SearchClient, SearchError};
use thiserror::Error;
use tracing::info;

pub mod schema;

pub use schema::IndexSchema;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to read schema directory {0}: {1}")]
    ReadDir(PathBuf, #[source] std::io::Error),
    #[error("failed to read schema file {0}: {1}")]
    ReadFile(PathBuf, #[source] std::io::Error),
    #[error("schema file {0} has no usable index name")]
    InvalidName(PathBuf),
    #[error("invalid json schema for index {index}: {source}")]
    InvalidSchema {
        index: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to migrate index {index}: {source}")]
    Search {
        index: String,
        #[source]
        source: SearchError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Created,
    /// Present before the run, or created concurrently by someone else.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub index: String,
    pub status: MigrationStatus,
}

pub struct Migrator {
    client: Arc<dyn SearchClient>,
}

impl Migrator {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }

    /// Apply every schema under `schema_dir`. Stops at the first failing index.
    pub async fn run(&self, schema_dir: &Path) -> Result<Vec<MigrationOutcome>, MigrationError> {
        info!(schema_dir = %schema_dir.display(), "starting index migrations");
        let mut outcomes = Vec::new();
        for path in schema::discover(schema_dir).await? {
            let schema = schema::load(&path).await?;
            let status = self.apply(&schema).await?;
            info!(index = %schema.index, ?status, "index migrated");
            outcomes.push(MigrationOutcome { index: schema.index, status });
        }
        Ok(outcomes)
    }

    pub async fn apply(&self, schema: &IndexSchema) -> Result<MigrationStatus, MigrationError> {
        let wrap = |source| MigrationError::Search { index: schema.index.clone(), source };

        if self.client.index_exists(&schema.index).await.map_err(wrap)? {
            info!(index = %schema.index, "index already exists, skipping");
            return Ok(MigrationStatus::Skipped);
        }
        match self.client.create_index(&schema.index, &schema.body).await.map_err(wrap)? {
            IndexCreation::Created => Ok(MigrationStatus::Created),
            IndexCreation::AlreadyExists => {
                info!(index = %schema.index, "index created concurrently, skipping");
                Ok(MigrationStatus::Skipped)
            }
        }
    }
}
