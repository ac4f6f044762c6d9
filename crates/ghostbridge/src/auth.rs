//! Bearer token guard in front of the wrapped handler.

use crate::token::BearerToken;
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use tower::Service;

/// Wrap `handler` so that it only sees requests carrying the bridge token.
///
/// The handler is mounted as the router fallback, so every method and path
/// reaches it exactly as the client sent it.
pub fn guard<H>(handler: H, token: BearerToken) -> Router
where
    H: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
    H::Response: IntoResponse + 'static,
    H::Future: Send + 'static,
{
    Router::new()
        .fallback_service(handler)
        .layer(middleware::from_fn_with_state(token, require_bearer))
}

/// Axum middleware rejecting any request whose `Authorization` header is not
/// exactly `Bearer <token>`.
pub async fn require_bearer(
    State(token): State<BearerToken>,
    req: Request,
    next: Next,
) -> Response {
    if is_authorized(&token, req.headers()) {
        return next.run(req).await;
    }

    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        "Rejected request without a valid bearer token"
    );
    forbidden()
}

fn is_authorized(token: &BearerToken, headers: &HeaderMap) -> bool {
    // A repeated header is ambiguous; only a single value is accepted.
    let mut values = headers.get_all(AUTHORIZATION).iter();
    match (values.next(), values.next()) {
        (Some(value), None) => token.matches(value.as_bytes()),
        _ => false,
    }
}

fn forbidden() -> Response {
    let status = StatusCode::FORBIDDEN;
    let text = status.canonical_reason().unwrap_or("Forbidden");
    (status, text).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, header::CONTENT_TYPE};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn counting_handler(calls: Arc<AtomicUsize>) -> Router {
        Router::new().fallback(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                "Yay, it works!"
            }
        })
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = BearerToken::generate().unwrap();
        let app = guard(counting_handler(calls.clone()), token.clone());

        let response = app
            .oneshot(request(Some(token.header_value())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Yay, it works!");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_header_is_forbidden() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = BearerToken::generate().unwrap();
        let app = guard(counting_handler(calls.clone()), token);

        let response = app.oneshot(request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let content_type = response.headers().get(CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Forbidden");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_credentials_are_forbidden() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = BearerToken::generate().unwrap();
        let app = guard(counting_handler(calls.clone()), token.clone());

        let exact = token.header_value();
        let candidates = [
            "Bearer wrong".to_string(),
            "Bearer ".to_string(),
            token.as_str().to_string(),
            exact[..exact.len() - 4].to_string(),
            exact.to_lowercase(),
            exact.replacen("Bearer", "Basic", 1),
            format!("{exact} "),
        ];

        for value in candidates {
            let response = app.clone().oneshot(request(Some(&value))).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "accepted {value:?}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_header_is_forbidden() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = BearerToken::generate().unwrap();
        let app = guard(counting_handler(calls.clone()), token.clone());

        let req = Request::builder()
            .uri("/")
            .header(AUTHORIZATION, token.header_value())
            .header(AUTHORIZATION, token.header_value())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_passes_through_unmodified() {
        let token = BearerToken::generate().unwrap();
        let expected_auth = token.header_value().to_string();

        let handler = Router::new().fallback(move |req: Request| {
            let expected_auth = expected_auth.clone();
            async move {
                assert_eq!(req.method(), Method::PATCH);
                assert_eq!(req.uri().path_and_query().unwrap(), "/deep/path?x=1&y=2");
                assert_eq!(req.headers()["x-custom"], "kept");
                assert_eq!(req.headers()[AUTHORIZATION], expected_auth.as_str());
                let body = to_bytes(req.into_body(), usize::MAX).await.unwrap();
                (StatusCode::ACCEPTED, [("x-reply", "1")], body)
            }
        });
        let app = guard(handler, token.clone());

        let req = Request::builder()
            .method(Method::PATCH)
            .uri("/deep/path?x=1&y=2")
            .header(AUTHORIZATION, token.header_value())
            .header("x-custom", "kept")
            .body(Body::from("payload bytes"))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-reply"], "1");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"payload bytes");
    }
}
