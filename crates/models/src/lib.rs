//! Catalog domain types and the search-engine adapter they are persisted through.

pub mod errors;
pub mod opensearch;
pub mod service;

pub use opensearch::{IndexCreation, OpenSearchClient, SearchClient, SearchError, SearchHits};
pub use service::{NewService, Service, Version, SERVICE_INDEX, UPDATED_AT_FIELD};
