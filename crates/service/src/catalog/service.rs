use std::sync::Arc;

use tracing::{info, instrument};

use crate::catalog::dto::{CreateServiceRequest, SearchResult, ServiceDto, UpdateServiceRequest};
use crate::catalog::repository::ServiceRepository;
use crate::errors::ServiceError;
use crate::pagination::Page;

/// Application service for the catalog.
/// Maps DTOs to domain entities and owns the update merge rules; validation happens in the
/// HTTP layer before any of these are called.
pub struct CatalogService {
    repo: Arc<dyn ServiceRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn ServiceRepository>) -> Self { Self { repo } }

    #[instrument(skip(self), fields(page = page.page, limit = page.limit))]
    pub async fn search(&self, query: &str, page: Page) -> Result<SearchResult, ServiceError> {
        let found = self.repo.search(query, page).await?;
        Ok(SearchResult {
            services: found.services.into_iter().map(ServiceDto::from).collect(),
            total: found.total,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<ServiceDto, ServiceError> {
        self.repo.find_by_id(id).await.map(ServiceDto::from)
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create(&self, req: CreateServiceRequest) -> Result<ServiceDto, ServiceError> {
        let created = self.repo.create(req.into()).await?;
        info!(id = %created.id, "service created");
        Ok(created.into())
    }

    /// Read-modify-write: a non-empty description replaces the current one, versions are
    /// appended. The name is never touched.
    #[instrument(skip(self, req))]
    pub async fn update(&self, id: &str, req: UpdateServiceRequest) -> Result<ServiceDto, ServiceError> {
        let mut svc = self.repo.find_by_id(id).await?;
        if let Some(description) = req.description.filter(|d| !d.is_empty()) {
            svc.description = description;
        }
        if let Some(versions) = req.versions {
            svc.append_versions(versions);
        }
        let updated = self.repo.update(svc).await?;
        info!(id = %updated.id, versions = updated.versions.len(), "service updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.repo.delete(id).await?;
        info!(%id, "service deleted");
        Ok(())
    }
}
