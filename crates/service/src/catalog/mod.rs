pub mod dto;
pub mod repository;
pub mod service;

pub use dto::{CreateServiceRequest, SearchResult, ServiceDto, UpdateServiceRequest};
pub use repository::{OpenSearchServiceRepository, ServicePage, ServiceRepository};
pub use service::CatalogService;
