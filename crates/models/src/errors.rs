use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse service: {0}")]
    Parse(#[from] serde_json::Error),
}
