use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use http::HeaderValue;
use tracing::{info, warn};

use super::extractors::REQUEST_ID_HEADER;
use crate::observability::{get_metrics, LatencyTimer};

/// Response header with the handling time in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Logs each request, records its metrics and stamps `X-Process-Time`.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let timer = LatencyTimer::new();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    info!(%method, path = %path, request_id = %request_id, "request started");

    let mut response = next.run(req).await;

    let elapsed = timer.elapsed_secs();
    let status = response.status();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.6}", elapsed)) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }

    get_metrics().record_http_request(method.as_str(), &path, status.as_u16(), timer.elapsed_ms());

    if status.is_server_error() {
        warn!(%method, path = %path, request_id = %request_id, status = status.as_u16(), elapsed, "request finished");
    } else {
        info!(%method, path = %path, request_id = %request_id, status = status.as_u16(), elapsed, "request finished");
    }

    response
}
