use models::errors::ModelError;
use models::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("search engine error: {0}")]
    Search(#[from] SearchError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: &str) -> Self { Self::NotFound(format!("{} {} not found", entity, id)) }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }

    pub fn is_conflict(&self) -> bool { matches!(self, Self::Conflict(_)) }
}
