use std::any::Any;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::CORRELATION_ID_HEADER;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::errors::{codes, ApiResponse, ErrorObj};
use crate::observability;

/// Reuse an inbound `X-Correlation-ID` or mint a UUID v4, run the rest of the stack inside a
/// span carrying it, and echo it on the response. Handler and panic logs inherit the span.
pub async fn correlation_id(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!("request", correlation_id = %id);
    let mut res = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    res
}

/// Count and time every request, labelled by its route template rather than the raw path.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let res = next.run(req).await;
    observability::observe(&method, &route, res.status().as_u16(), started.elapsed().as_secs_f64());
    res
}

/// `CatchPanicLayer` handler: log the payload and answer with the standard 500 envelope.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "panic recovered");

    let body = ApiResponse::failure(vec![ErrorObj::new(
        codes::GENERIC_SERVICE_ERROR,
        "internal",
        "internal server error",
    )]);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
