//! API Middleware
//!
//! Request ids and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the per-request id, accepted from clients and echoed back
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id stored in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

/// Reuse a well-formed client id, otherwise mint a new one
fn resolve_request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let request_id = resolve_request_id(request.headers());
    request.extensions_mut().insert(RequestId(request_id));

    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        request_id = %request_id,
        headers = ?headers,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Extension, Router};
    use tower::ServiceExt;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        headers.insert("x-request-id", "req-1".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let request_id = masked.iter().find(|(k, _)| k == "x-request-id");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(request_id.unwrap().1, "req-1");
    }

    #[test]
    fn test_resolve_request_id() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, id.to_string().parse().unwrap());
        assert_eq!(resolve_request_id(&headers), id);

        headers.insert(REQUEST_ID_HEADER, "not-a-uuid".parse().unwrap());
        assert_ne!(resolve_request_id(&headers), Uuid::nil());
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = Router::new()
            .route(
                "/",
                get(|Extension(RequestId(id)): Extension<RequestId>| async move { id.to_string() }),
            )
            .layer(axum::middleware::from_fn(logging_middleware));

        let id = Uuid::new_v4();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, id.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            &id.to_string()
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, id.to_string());
    }
}
