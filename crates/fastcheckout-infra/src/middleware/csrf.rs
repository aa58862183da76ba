//! CSRF (Cross-Site Request Forgery) protection middleware
//!
//! Double-submit cookie check: for state-changing methods the `X-CSRF-Token` header
//! must be present and equal to the `csrf-token` cookie.

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use fastcheckout_core::AppError;
use rand::RngCore;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::envelope_response;

pub const CSRF_HEADER_NAME: &str = "x-csrf-token";
pub const CSRF_COOKIE_NAME: &str = "csrf-token";

#[derive(Debug, Clone, Copy)]
pub struct CsrfConfig {
    /// When false every request passes through untouched.
    pub enabled: bool,
    /// Adds `Secure` to the issued cookie.
    pub secure_cookie: bool,
}

/// 32 random bytes, hex encoded.
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// `Set-Cookie` value for a freshly issued token. Readable by scripts so the
/// client can echo it back in the header.
pub fn csrf_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; SameSite=Strict", CSRF_COOKIE_NAME, token);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// True when both tokens are present, non-empty and equal.
fn tokens_match(header_token: Option<&str>, cookie_token: Option<&str>) -> bool {
    match (header_token, cookie_token) {
        (Some(h), Some(c)) if !h.is_empty() && !c.is_empty() => {
            h.as_bytes().ct_eq(c.as_bytes()).into()
        }
        _ => false,
    }
}

/// CSRF protection middleware
///
/// GET, HEAD and OPTIONS are never checked.
pub async fn csrf_middleware(
    State(config): State<Arc<CsrfConfig>>,
    request: Request,
    next: Next,
) -> Response {
    if !config.enabled || matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS)
    {
        return next.run(request).await;
    }

    let headers = request.headers();
    let header_token = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|v| v.to_str().ok());
    let cookie_token = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookies| cookie_value(cookies, CSRF_COOKIE_NAME));

    if !tokens_match(header_token, cookie_token) {
        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            has_header = header_token.is_some(),
            has_cookie = cookie_token.is_some(),
            "CSRF token validation failed"
        );
        return envelope_response(&AppError::CsrfValidationFailed, false);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    fn app(enabled: bool) -> Router {
        Router::new()
            .route("/pay", post(|| async { "ok" }).get(|| async { "read" }))
            .layer(axum::middleware::from_fn_with_state(
                Arc::new(CsrfConfig {
                    enabled,
                    secure_cookie: false,
                }),
                csrf_middleware,
            ))
    }

    fn request(method: &str, header: Option<&str>, cookie: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method(method).uri("/pay");
        if let Some(h) = header {
            builder = builder.header(CSRF_HEADER_NAME, h);
        }
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_generate_csrf_token() {
        let a = generate_csrf_token();
        let b = generate_csrf_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cookie_value_parsing() {
        let cookies = "theme=dark; csrf-token=abc123; other=x";
        assert_eq!(cookie_value(cookies, "csrf-token"), Some("abc123"));
        assert_eq!(cookie_value(cookies, "missing"), None);
        assert_eq!(cookie_value("csrf-token-old=1", "csrf-token"), None);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(Some("abc"), Some("abc")));
        assert!(!tokens_match(Some("abc"), Some("abd")));
        assert!(!tokens_match(None, Some("abc")));
        assert!(!tokens_match(Some(""), Some("")));
    }

    #[test]
    fn test_csrf_cookie_flags() {
        assert_eq!(
            csrf_cookie("t", false),
            "csrf-token=t; Path=/; SameSite=Strict"
        );
        assert!(csrf_cookie("t", true).ends_with("; Secure"));
    }

    #[tokio::test]
    async fn test_safe_methods_bypass() {
        let response = app(true).oneshot(request("GET", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_matching_tokens_pass() {
        let response = app(true)
            .oneshot(request("POST", Some("tok"), Some("a=1; csrf-token=tok")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mismatch_is_forbidden_with_envelope() {
        let response = app(true)
            .oneshot(request("POST", Some("tok"), Some("csrf-token=other")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "CSRF_VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_missing_cookie_is_forbidden() {
        let response = app(true)
            .oneshot(request("POST", Some("tok"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_disabled_passes_everything() {
        let response = app(false)
            .oneshot(request("POST", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
