#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use models::{NewService, Service};
use serde_json::Value;
use server::{build_router, AppState};
use service::{CatalogService, Page, ServiceError, ServicePage, ServiceRepository};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

/// Repository fake that mimics the search engine closely enough for handler tests:
/// case-insensitive phrase match over name/description, newest `updated_at` first,
/// from/size paging, and create-only inserts.
#[derive(Default)]
pub struct InMemoryRepository {
    pub services: Mutex<BTreeMap<String, Service>>,
}

impl InMemoryRepository {
    /// `n` services named `Service {i}`, each updated one second after the previous.
    pub fn seeded(n: usize) -> Self {
        let repo = Self::default();
        let base = Utc::now() - Duration::hours(1);
        {
            let mut map = repo.services.lock().unwrap();
            for i in 0..n {
                let at = base + Duration::seconds(i as i64);
                let svc = NewService {
                    id: Some(format!("svc-{i:03}")),
                    name: format!("Service {i}"),
                    description: format!("description {i}"),
                    ..Default::default()
                }
                .into_service(at);
                map.insert(svc.id.clone(), svc);
            }
        }
        repo
    }
}

#[async_trait]
impl ServiceRepository for InMemoryRepository {
    async fn create(&self, new: NewService) -> Result<Service, ServiceError> {
        let svc = new.into_service(Utc::now());
        let mut services = self.services.lock().unwrap();
        if services.contains_key(&svc.id) {
            return Err(ServiceError::Conflict(format!("service {} already exists", svc.id)));
        }
        services.insert(svc.id.clone(), svc.clone());
        Ok(svc)
    }

    async fn search(&self, query: &str, page: Page) -> Result<ServicePage, ServiceError> {
        let phrase = words(query);
        let mut hits: Vec<Service> = self
            .services
            .lock()
            .unwrap()
            .values()
            .filter(|s| contains_phrase(&words(&s.name), &phrase) || contains_phrase(&words(&s.description), &phrase))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let total = hits.len() as u64;
        let services = hits
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(ServicePage { services, total })
    }

    async fn find_by_id(&self, id: &str) -> Result<Service, ServiceError> {
        self.services
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("service", id))
    }

    async fn update(&self, mut service: Service) -> Result<Service, ServiceError> {
        service.touch(Utc::now());
        self.services.lock().unwrap().insert(service.id.clone(), service.clone());
        Ok(service)
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        match self.services.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("service", id)),
        }
    }
}

/// Lowercased alphanumeric tokens, roughly what the standard analyzer produces.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `phrase` occurs in `text` as consecutive tokens. An empty phrase matches everything.
pub fn contains_phrase(text: &[String], phrase: &[String]) -> bool {
    phrase.is_empty() || text.windows(phrase.len()).any(|w| w == phrase)
}

/// Every call fails like an unreachable cluster.
pub struct FailingRepository;

fn unavailable() -> ServiceError {
    ServiceError::Search(models::SearchError::Status { status: 503, body: "unavailable".into() })
}

#[async_trait]
impl ServiceRepository for FailingRepository {
    async fn create(&self, _: NewService) -> Result<Service, ServiceError> { Err(unavailable()) }
    async fn search(&self, _: &str, _: Page) -> Result<ServicePage, ServiceError> { Err(unavailable()) }
    async fn find_by_id(&self, _: &str) -> Result<Service, ServiceError> { Err(unavailable()) }
    async fn update(&self, _: Service) -> Result<Service, ServiceError> { Err(unavailable()) }
    async fn delete(&self, _: &str) -> Result<(), ServiceError> { Err(unavailable()) }
}

/// Panics on search; the other operations behave like an empty catalog.
pub struct PanickingRepository;

#[async_trait]
impl ServiceRepository for PanickingRepository {
    async fn create(&self, new: NewService) -> Result<Service, ServiceError> { Ok(new.into_service(Utc::now())) }
    async fn search(&self, _: &str, _: Page) -> Result<ServicePage, ServiceError> { panic!("search exploded") }
    async fn find_by_id(&self, id: &str) -> Result<Service, ServiceError> { Err(ServiceError::not_found("service", id)) }
    async fn update(&self, s: Service) -> Result<Service, ServiceError> { Ok(s) }
    async fn delete(&self, id: &str) -> Result<(), ServiceError> { Err(ServiceError::not_found("service", id)) }
}

pub fn app(repo: Arc<dyn ServiceRepository>) -> Router {
    build_router(AppState::new(CatalogService::new(repo)), CorsLayer::very_permissive())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let res = app.clone().oneshot(req).await.expect("router never errors");
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse { status, headers, body }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: &str) -> TestResponse {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}
