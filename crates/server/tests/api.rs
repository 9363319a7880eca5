mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};

use support::{app, delete, get, send, send_json, FailingRepository, InMemoryRepository, PanickingRepository};

const CREATE_BODY: &str = r#"{
    "name": "Special Rates",
    "description": "special rates for loyal customers",
    "versions": [{"version_number": "1.0", "details": "Initial"}]
}"#;

fn error_entities(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|e| e["entity"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = app(Arc::new(InMemoryRepository::default()));
    let res = get(&app, "/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"status": "ok"}));

    get(&app, "/api/services").await;
    let metrics = get(&app, "/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    let text = metrics.body.as_str().expect("plain text");
    assert!(text.contains("catalog_http_requests_total"));
    assert!(text.contains(r#"route="/api/services""#));
}

#[tokio::test]
async fn openapi_document_is_published() {
    let app = app(Arc::new(InMemoryRepository::default()));
    let res = get(&app, "/api-docs/openapi.json").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["paths"]["/api/services/{id}"]["put"].is_object());
}

#[tokio::test]
async fn search_rejects_bad_paging_naming_each_field() {
    let app = app(Arc::new(InMemoryRepository::default()));

    let res = get(&app, "/api/services?page=0&limit=10").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["errors"][0], json!({"code": "MALFORMED_DATA", "entity": "page", "cause": "invalid page"}));

    let res = get(&app, "/api/services?page=1&limit=abc").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_entities(&res.body), ["limit"]);

    let res = get(&app, "/api/services?page=abc&limit=0").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_entities(&res.body), ["page", "limit"]);
}

#[tokio::test]
async fn empty_query_lists_newest_first_with_next_link() {
    let app = app(Arc::new(InMemoryRepository::seeded(40)));

    let res = get(&app, "/api/services?page=1&limit=5").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    let data = &res.body["data"];
    assert_eq!(data["count"], 40);
    let services = data["services"].as_array().expect("services");
    assert_eq!(services.len(), 5);
    assert_eq!(services[0]["id"], "svc-039");
    assert_eq!(services[4]["id"], "svc-035");
    assert_eq!(data["next"], "/api/services?limit=5&page=2");
}

#[tokio::test]
async fn repeated_query_keys_use_the_first_value() {
    let app = app(Arc::new(InMemoryRepository::seeded(40)));

    let res = get(&app, "/api/services?page=2&page=1&limit=5").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["data"]["services"][0]["id"], "svc-034");
    assert_eq!(res.body["data"]["next"], "/api/services?limit=5&page=3");

    let res = get(&app, "/api/services?page=0&page=1").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["entity"], "page");
}

#[tokio::test]
async fn next_is_null_on_last_page_and_defaults_apply() {
    let app = app(Arc::new(InMemoryRepository::seeded(10)));

    let res = get(&app, "/api/services?page=2&limit=5").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["services"].as_array().map(Vec::len), Some(5));
    assert_eq!(res.body["data"]["next"], Value::Null);

    let res = get(&app, "/api/services").await;
    assert_eq!(res.body["data"]["services"].as_array().map(Vec::len), Some(10));
    assert_eq!(res.body["data"]["next"], Value::Null);
}

#[tokio::test]
async fn phrase_query_is_carried_into_next_link() {
    let app = app(Arc::new(InMemoryRepository::seeded(0)));
    for _ in 0..3 {
        assert_eq!(send_json(&app, "POST", "/api/services", CREATE_BODY).await.status, StatusCode::CREATED);
    }
    let other = r#"{"name": "Locate Us", "versions": [{"version_number": "1"}]}"#;
    send_json(&app, "POST", "/api/services", other).await;
    let reordered = r#"{"name": "Rates", "description": "rates that are special", "versions": [{"version_number": "1"}]}"#;
    send_json(&app, "POST", "/api/services", reordered).await;
    let split = r#"{"name": "Specials", "description": "specialrates, special-ish rates", "versions": [{"version_number": "1"}]}"#;
    send_json(&app, "POST", "/api/services", split).await;

    let res = get(&app, "/api/services?q=special%20rates&limit=2&trace=on").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["count"], 3);
    assert_eq!(res.body["data"]["next"], "/api/services?limit=2&page=2&q=special+rates&trace=on");
}

#[tokio::test]
async fn create_then_fetch_round_trips() {
    let app = app(Arc::new(InMemoryRepository::default()));

    let created = send_json(&app, "POST", "/api/services", CREATE_BODY).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["success"], true);
    let data = &created.body["data"];
    let id = data["id"].as_str().expect("id");
    assert!(!id.is_empty());
    assert!(data["created_at"].as_str().expect("created_at").ends_with('Z'));

    let fetched = get(&app, &format!("/api/services/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["name"], "Special Rates");
    assert_eq!(fetched.body["data"]["description"], "special rates for loyal customers");
    assert_eq!(fetched.body["data"]["versions"], json!([{"version_number": "1.0", "details": "Initial"}]));
    assert_eq!(fetched.body["data"]["created_at"], data["created_at"]);
}

#[tokio::test]
async fn create_with_existing_id_is_rejected_and_keeps_original() {
    let app = app(Arc::new(InMemoryRepository::default()));
    let original = r#"{"id": "svc-dup", "name": "Original", "versions": [{"version_number": "1.0"}]}"#;
    let first = send_json(&app, "POST", "/api/services", original).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let hijack = r#"{"id": "svc-dup", "name": "Hijacked", "versions": [{"version_number": "9.9"}]}"#;
    let res = send_json(&app, "POST", "/api/services", hijack).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(
        res.body,
        json!({"success": false, "errors": [{"code": "SERVICE_ALREADY_EXISTS", "entity": "id", "cause": "service already exists"}]})
    );

    let fetched = get(&app, "/api/services/svc-dup").await;
    assert_eq!(fetched.body["data"]["name"], "Original");
    assert_eq!(fetched.body["data"]["created_at"], first.body["data"]["created_at"]);
}

#[tokio::test]
async fn create_validates_body() {
    let app = app(Arc::new(InMemoryRepository::default()));

    let res = send_json(&app, "POST", "/api/services", "{ not json").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["errors"],
        json!([{"code": "MALFORMED_DATA", "entity": "service", "cause": "invalid request body"}])
    );

    let res = send_json(&app, "POST", "/api/services", r#"{"versions": []}"#).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_entities(&res.body), ["name", "versions"]);

    let res = send_json(&app, "POST", "/api/services", r#"{"name": "x", "versions": [{"details": "no number"}]}"#).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["cause"], "versions[0].version_number is required");
}

#[tokio::test]
async fn update_rejects_rename_and_appends_versions() {
    let app = app(Arc::new(InMemoryRepository::default()));
    let created = send_json(&app, "POST", "/api/services", CREATE_BODY).await;
    let uri = format!("/api/services/{}", created.body["data"]["id"].as_str().expect("id"));

    let res = send_json(&app, "PUT", &uri, r#"{"name": "Renamed"}"#).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0], json!({"code": "MALFORMED_DATA", "entity": "name", "cause": "name cannot be updated"}));

    let first = send_json(
        &app,
        "PUT",
        &uri,
        r#"{"description": "Updated description", "versions": [{"version_number": "2.0", "details": "second"}]}"#,
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);
    let second = send_json(&app, "PUT", &uri, r#"{"versions": [{"version_number": "3.0"}, {"version_number": "3.1"}]}"#).await;
    assert_eq!(second.status, StatusCode::OK);

    let data = &second.body["data"];
    assert_eq!(data["name"], "Special Rates");
    assert_eq!(data["description"], "Updated description");
    assert_eq!(data["versions"].as_array().map(Vec::len), Some(4));
    assert_eq!(data["versions"][3]["version_number"], "3.1");
}

#[tokio::test]
async fn update_missing_service_and_bad_body() {
    let app = app(Arc::new(InMemoryRepository::default()));

    let res = send_json(&app, "PUT", "/api/services/nope", r#"{"description": "x"}"#).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["errors"][0]["code"], "SERVICE_NOT_FOUND");

    let res = send_json(&app, "PUT", "/api/services/nope", "[1, 2").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["cause"], "invalid request body");
}

#[tokio::test]
async fn delete_then_fetch_is_not_found() {
    let app = app(Arc::new(InMemoryRepository::default()));
    let created = send_json(&app, "POST", "/api/services", CREATE_BODY).await;
    let uri = format!("/api/services/{}", created.body["data"]["id"].as_str().expect("id"));

    let res = delete(&app, &uri).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"success": true}));

    let res = get(&app, &uri).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.body,
        json!({"success": false, "errors": [{"code": "SERVICE_NOT_FOUND", "entity": "service", "cause": "service not found"}]})
    );

    assert_eq!(delete(&app, &uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn engine_failures_are_opaque_500s() {
    let app = app(Arc::new(FailingRepository));

    let res = get(&app, "/api/services").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.body["errors"],
        json!([{"code": "GENERIC_SERVICE_ERROR", "entity": "service", "cause": "search failed"}])
    );

    assert_eq!(get(&app, "/api/services/abc").await.status, StatusCode::INTERNAL_SERVER_ERROR);
    let res = send_json(&app, "POST", "/api/services", CREATE_BODY).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["errors"][0]["cause"], "failed to create service");
    assert_eq!(delete(&app, "/api/services/abc").await.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn correlation_id_is_generated_or_echoed() {
    let app = app(Arc::new(InMemoryRepository::default()));

    let res = get(&app, "/health").await;
    let generated = res.headers.get("x-correlation-id").expect("header").to_str().expect("ascii");
    assert_eq!(uuid::Uuid::parse_str(generated).ok().map(|u| u.get_version_num()), Some(4));

    let req = Request::get("/api/services/missing")
        .header("X-Correlation-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let res = send(&app, req).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.headers.get("x-correlation-id").and_then(|v| v.to_str().ok()), Some("abc-123"));
}

#[tokio::test]
async fn handler_panic_becomes_500_envelope() {
    let app = app(Arc::new(PanickingRepository));

    let res = get(&app, "/api/services").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.body,
        json!({"success": false, "errors": [{"code": "GENERIC_SERVICE_ERROR", "entity": "internal", "cause": "internal server error"}]})
    );
    assert!(res.headers.contains_key("x-correlation-id"));
}
