#![cfg(test)]
use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use models::{IndexCreation, SearchClient, SearchError, SearchHits};
use serde_json::Value;

/// Single-index stand-in for OpenSearch. Search ignores the query and pages over every
/// document in id order; the last search body is kept for assertions.
#[derive(Default)]
pub struct InMemorySearchClient {
    pub docs: Mutex<BTreeMap<String, Value>>,
    pub last_search: Mutex<Option<Value>>,
    /// Every call fails with a 503 when set.
    pub fail: bool,
}

impl InMemorySearchClient {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    fn check(&self) -> Result<(), SearchError> {
        if self.fail {
            return Err(SearchError::Status { status: 503, body: "cluster unavailable".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchClient for InMemorySearchClient {
    async fn index_exists(&self, _index: &str) -> Result<bool, SearchError> {
        self.check()?;
        Ok(true)
    }

    async fn create_index(&self, _index: &str, _body: &Value) -> Result<IndexCreation, SearchError> {
        self.check()?;
        Ok(IndexCreation::AlreadyExists)
    }

    async fn index_document(&self, _index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        self.check()?;
        self.docs.lock().unwrap().insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn create_document(&self, _index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        self.check()?;
        let mut docs = self.docs.lock().unwrap();
        if docs.contains_key(id) {
            return Err(SearchError::Conflict(id.to_string()));
        }
        docs.insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn search(&self, _index: &str, body: &Value) -> Result<SearchHits, SearchError> {
        self.check()?;
        *self.last_search.lock().unwrap() = Some(body.clone());
        let docs = self.docs.lock().unwrap();
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let hits = docs.values().skip(from).take(size).cloned().collect();
        Ok(SearchHits { hits, total: docs.len() as u64 })
    }

    async fn get_document(&self, _index: &str, id: &str) -> Result<Option<Value>, SearchError> {
        self.check()?;
        Ok(self.docs.lock().unwrap().get(id).cloned())
    }

    async fn delete_document(&self, _index: &str, id: &str) -> Result<bool, SearchError> {
        self.check()?;
        Ok(self.docs.lock().unwrap().remove(id).is_some())
    }
}
