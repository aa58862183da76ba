//! Request/response audit logging

use crate::middleware::tenant::TENANT_HEADER;
use crate::utils::ip_extraction::client_ip_or_unknown;
use axum::{
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;

/// Logs the request before the inner layers run and the outcome after.
/// The response is passed through untouched.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let url = request.uri().to_string();
    let headers = request.headers();
    let tenant_id = headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let ip = client_ip_or_unknown(
        headers,
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| &info.0),
    );

    tracing::info!(
        method = %method,
        url = %url,
        tenant_id = %tenant_id,
        user_agent = %user_agent,
        ip = %ip,
        "Request received"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        url = %url,
        tenant_id = %tenant_id,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
