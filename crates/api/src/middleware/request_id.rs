//! Request ID middleware for request tracing and correlation.
//!
//! Uses the `x-request-id` header from an upstream proxy when present,
//! otherwise generates a UUID v4. The ID is recorded on the request span,
//! tagged on the Sentry scope and echoed back in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted as-is; longer ones are replaced.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn echoed_id(header: Option<&str>) -> String {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn(request_id_middleware));

        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_upstream_id_is_echoed() {
        assert_eq!(echoed_id(Some("abc-123")).await, "abc-123");
    }

    #[tokio::test]
    async fn test_missing_or_empty_id_is_generated() {
        let generated = echoed_id(None).await;
        assert!(Uuid::parse_str(&generated).is_ok());

        let generated = echoed_id(Some("")).await;
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[tokio::test]
    async fn test_overlong_id_is_replaced() {
        let at_limit = "a".repeat(MAX_UPSTREAM_ID_LEN);
        assert_eq!(echoed_id(Some(&at_limit)).await, at_limit);

        let overlong = "a".repeat(MAX_UPSTREAM_ID_LEN + 1);
        let replaced = echoed_id(Some(&overlong)).await;
        assert_ne!(replaced, overlong);
        assert!(Uuid::parse_str(&replaced).is_ok());
    }
}
