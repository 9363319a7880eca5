use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use models::{NewService, SearchClient, SearchError, Service, SERVICE_INDEX, UPDATED_AT_FIELD};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::errors::ServiceError;
use crate::pagination::Page;

/// One page of services plus the engine's total hit count.
#[derive(Clone, Debug, PartialEq)]
pub struct ServicePage {
    pub services: Vec<Service>,
    pub total: u64,
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Insert a new service. An id that is already stored yields `ServiceError::Conflict`
    /// and leaves the stored document untouched.
    async fn create(&self, new: NewService) -> Result<Service, ServiceError>;
    async fn search(&self, query: &str, page: Page) -> Result<ServicePage, ServiceError>;
    async fn find_by_id(&self, id: &str) -> Result<Service, ServiceError>;
    /// Persist a modified service. `updated_at` is refreshed; last writer wins.
    async fn update(&self, service: Service) -> Result<Service, ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
}

/// Build the `_search` body: `match_all` for a blank query, otherwise an exact-phrase
/// `simple_query_string` over name and description. Newest `updated_at` first in both cases.
pub fn build_search_body(query: &str, page: Page) -> Value {
    let query = query.trim();
    let clause = if query.is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({
            "simple_query_string": {
                "query": format!("\"{}\"", query),
                "fields": ["name", "description"],
                "default_operator": "and"
            }
        })
    };
    json!({
        "query": clause,
        "from": page.offset(),
        "size": page.limit,
        "sort": [ { UPDATED_AT_FIELD: { "order": "desc" } } ]
    })
}

/// OpenSearch-backed repository implementation.
pub struct OpenSearchServiceRepository {
    client: Arc<dyn SearchClient>,
    index: String,
}

impl OpenSearchServiceRepository {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self::with_index(client, SERVICE_INDEX)
    }

    pub fn with_index(client: Arc<dyn SearchClient>, index: impl Into<String>) -> Self {
        Self { client, index: index.into() }
    }

}

#[async_trait]
impl ServiceRepository for OpenSearchServiceRepository {
    async fn create(&self, new: NewService) -> Result<Service, ServiceError> {
        let service = new.into_service(Utc::now());
        debug!(id = %service.id, index = %self.index, "inserting service");
        let doc = service.to_document()?;
        match self.client.create_document(&self.index, &service.id, &doc).await {
            Ok(()) => Ok(service),
            Err(SearchError::Conflict(_)) => {
                info!(id = %service.id, "service id already taken");
                Err(ServiceError::Conflict(format!("service {} already exists", service.id)))
            }
            Err(e) => {
                error!(id = %service.id, error = %e, "failed to index service");
                Err(e.into())
            }
        }
    }

    async fn search(&self, query: &str, page: Page) -> Result<ServicePage, ServiceError> {
        debug!(%query, page = page.page, limit = page.limit, from = page.offset(), "searching services");
        let body = build_search_body(query, page);
        let found = self.client.search(&self.index, &body).await.map_err(|e| {
            error!(error = %e, "search query failed");
            e
        })?;

        let services = found
            .hits
            .into_iter()
            .filter_map(|hit| match Service::from_document(hit) {
                Ok(svc) => Some(svc),
                Err(e) => {
                    error!(error = %e, "failed to decode search hit; skipping");
                    None
                }
            })
            .collect();

        info!(total = found.total, "search completed");
        Ok(ServicePage { services, total: found.total })
    }

    async fn find_by_id(&self, id: &str) -> Result<Service, ServiceError> {
        match self.client.get_document(&self.index, id).await? {
            Some(doc) => Ok(Service::from_document(doc)?),
            None => Err(ServiceError::not_found("service", id)),
        }
    }

    async fn update(&self, mut service: Service) -> Result<Service, ServiceError> {
        service.touch(Utc::now());
        debug!(id = %service.id, "reindexing service");
        let doc = service.to_document()?;
        self.client.index_document(&self.index, &service.id, &doc).await?;
        Ok(service)
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.client.delete_document(&self.index, id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("service", id))
        }
    }
}
