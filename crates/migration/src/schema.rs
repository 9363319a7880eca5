//! Index schema files: one `<index>.json` per index, applied in file-name order.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::MigrationError;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    pub index: String,
    pub path: PathBuf,
    pub body: Value,
}

/// List `*.json` files directly under `dir`, sorted by file name. Sub-directories are ignored.
pub async fn discover(dir: &Path) -> Result<Vec<PathBuf>, MigrationError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| MigrationError::ReadDir(dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| MigrationError::ReadDir(dir.to_path_buf(), e))?
    {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read one schema file; the index name is the file stem.
pub async fn load(path: &Path) -> Result<IndexSchema, MigrationError> {
    let index = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MigrationError::InvalidName(path.to_path_buf()))?
        .to_string();
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| MigrationError::ReadFile(path.to_path_buf(), e))?;
    let body: Value = serde_json::from_slice(&raw)
        .map_err(|e| MigrationError::InvalidSchema { index: index.clone(), source: e })?;
    Ok(IndexSchema { index, path: path.to_path_buf(), body })
}
