//! OpenSearch access.
//!
//! `SearchClient` is the seam the repository and the migrator are written against;
//! `OpenSearchClient` talks to the cluster's REST API over a pooled `reqwest` client.
//! Nothing here retries: every transport, status or decode failure is returned as-is.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use configs::OpenSearchConfig;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid opensearch configuration: {0}")]
    InvalidConfig(String),
    #[error("opensearch request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("opensearch returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected opensearch response: {0}")]
    Decode(String),
    #[error("document {0} already exists")]
    Conflict(String),
}

/// `_source` of every hit plus the total reported by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub hits: Vec<Value>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;
    async fn create_index(&self, index: &str, body: &Value) -> Result<IndexCreation, SearchError>;
    /// Writes are refreshed immediately so they are visible to the next search.
    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError>;
    /// Like `index_document`, but fails with `SearchError::Conflict` instead of replacing
    /// an existing document.
    async fn create_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError>;
    async fn search(&self, index: &str, body: &Value) -> Result<SearchHits, SearchError>;
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError>;
    /// `Ok(false)` when the document did not exist.
    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchError>;
}

pub struct OpenSearchClient {
    http: Client,
    hosts: Vec<Url>,
    next_host: AtomicUsize,
    credentials: Option<(String, Option<String>)>,
}

impl OpenSearchClient {
    pub fn new(cfg: &OpenSearchConfig) -> Result<Self, SearchError> {
        if cfg.hosts.is_empty() {
            return Err(SearchError::InvalidConfig("no hosts configured".into()));
        }
        let hosts = cfg
            .hosts
            .iter()
            .map(|h| {
                let url = Url::parse(h).map_err(|e| SearchError::InvalidConfig(format!("{h}: {e}")))?;
                if url.cannot_be_a_base() {
                    return Err(SearchError::InvalidConfig(format!("{h}: not a base url")));
                }
                Ok(url)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let http = Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(cfg.connect_timeout())
            .pool_idle_timeout(cfg.idle_timeout())
            .pool_max_idle_per_host(cfg.max_idle_per_host)
            .tcp_keepalive(cfg.keepalive())
            .build()
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;

        let credentials = cfg.username.clone().map(|u| (u, cfg.password.clone()));
        info!(hosts = ?cfg.hosts, timeout_ms = cfg.timeout_ms, "opensearch client created");
        Ok(Self { http, hosts, next_host: AtomicUsize::new(0), credentials })
    }

    /// Round-robin over the configured hosts.
    fn url(&self, segments: &[&str]) -> Url {
        let i = self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        let mut url = self.hosts[i].clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.http.request(method, url);
        match &self.credentials {
            Some((user, pass)) => req.basic_auth(user, pass.as_ref()),
            None => req,
        }
    }
}

async fn status_error(resp: Response) -> SearchError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    SearchError::Status { status, body }
}

async fn decode_json(resp: Response) -> Result<Value, SearchError> {
    resp.json::<Value>()
        .await
        .map_err(|e| SearchError::Decode(e.to_string()))
}

/// Accepts both `{"total": {"value": n}}` and the legacy `{"total": n}`.
pub fn parse_search_response(body: &Value) -> Result<SearchHits, SearchError> {
    let hits = body
        .get("hits")
        .ok_or_else(|| SearchError::Decode("missing hits".into()))?;
    let items = hits
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::Decode("unexpected hits format".into()))?;
    let total = match hits.get("total") {
        Some(Value::Object(t)) => t.get("value").and_then(Value::as_u64).unwrap_or(0),
        Some(v) => v.as_u64().unwrap_or(0),
        None => 0,
    };
    let hits = items.iter().filter_map(|h| h.get("_source").cloned()).collect();
    Ok(SearchHits { hits, total })
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

#[async_trait]
impl SearchClient for OpenSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let resp = self.request(Method::HEAD, self.url(&[index])).send().await?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(resp).await),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<IndexCreation, SearchError> {
        let resp = self.request(Method::PUT, self.url(&[index])).json(body).send().await?;
        if resp.status().is_success() {
            info!(%index, "index created");
            return Ok(IndexCreation::Created);
        }
        match status_error(resp).await {
            SearchError::Status { status: 400, body } if body.contains("resource_already_exists_exception") => {
                info!(%index, "index already exists");
                Ok(IndexCreation::AlreadyExists)
            }
            e => Err(e),
        }
    }

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        let mut url = self.url(&[index, "_doc", id]);
        url.query_pairs_mut().append_pair("refresh", "true");
        let resp = self.request(Method::PUT, url).json(document).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let body = decode_json(resp).await?;
        let doc_id = body.get("_id").and_then(Value::as_str).unwrap_or(id);
        info!(%index, id = %doc_id, "document indexed");
        Ok(())
    }

    async fn create_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        let mut url = self.url(&[index, "_create", id]);
        url.query_pairs_mut().append_pair("refresh", "true");
        let resp = self.request(Method::PUT, url).json(document).send().await?;
        match resp.status() {
            StatusCode::CONFLICT => Err(SearchError::Conflict(id.to_string())),
            s if s.is_success() => {
                info!(%index, %id, "document created");
                Ok(())
            }
            _ => Err(status_error(resp).await),
        }
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchHits, SearchError> {
        debug!(%index, body = %body, "search request");
        let resp = self
            .request(Method::POST, self.url(&[index, "_search"]))
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        parse_search_response(&decode_json(resp).await?)
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, SearchError> {
        debug!(%index, %id, "get document");
        let resp = self.request(Method::GET, self.url(&[index, "_doc", id])).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let got: GetResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(if got.found { got.source } else { None })
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        let mut url = self.url(&[index, "_doc", id]);
        url.query_pairs_mut().append_pair("refresh", "true");
        let resp = self.request(Method::DELETE, url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => {
                info!(%index, %id, "document deleted");
                Ok(true)
            }
            _ => Err(status_error(resp).await),
        }
    }
}
