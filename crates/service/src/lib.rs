//! Service layer for the catalog.
//! - `catalog`: repository seam over the search engine plus the use-case service.
//! - `ingest`: NDJSON bulk loading through the same repository.
//! - Errors are typed here and mapped to HTTP by the server crate.

pub mod catalog;
pub mod errors;
pub mod ingest;
pub mod pagination;
#[cfg(test)]
pub mod test_support;

pub use catalog::{CatalogService, OpenSearchServiceRepository, ServicePage, ServiceRepository};
pub use errors::ServiceError;
pub use pagination::Page;
