//! Fixed-window rate limiting for tenant routes
//!
//! Requests are counted per tenant when the tenant header is present, else per
//! client address, else under one shared anonymous key.

use crate::error::HttpAppError;
use crate::middleware::tenant::TENANT_HEADER;
use crate::utils::ip_extraction::client_ip;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fastcheckout_core::AppError;
use fastcheckout_infra::{RateLimitDecision, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

pub fn rate_limit_key(headers: &HeaderMap, socket_addr: Option<&SocketAddr>) -> String {
    let tenant = headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(tenant) = tenant {
        return format!("tenant:{}", tenant.to_lowercase());
    }

    match client_ip(headers, socket_addr) {
        Some(ip) => format!("ip:{}", ip),
        None => "anonymous".to_string(),
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = rate_limit_key(
        request.headers(),
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| &info.0),
    );

    match limiter.check(&key).await {
        decision @ RateLimitDecision::Limited { .. } => {
            let retry_after_secs = decision.retry_after_secs().unwrap_or(1);
            tracing::warn!(key = %key, retry_after_secs, "Rate limit exceeded");
            HttpAppError(AppError::RateLimitExceeded { retry_after_secs }).into_response()
        }
        RateLimitDecision::Allowed { remaining, .. } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                RATE_LIMIT_LIMIT_HEADER,
                HeaderValue::from(limiter.max_requests()),
            );
            headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
    }
}
