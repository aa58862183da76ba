//! Client address extraction
//!
//! The checkout service sits behind the storefront's proxy, which puts the
//! shopper's address first in `X-Forwarded-For`.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Returns the originating client address, or `None` when nothing usable is present.
///
/// Looks at the leftmost valid entry of `X-Forwarded-For`, then `X-Real-IP`, then
/// the socket peer.
pub fn client_ip(headers: &HeaderMap, socket_addr: Option<&SocketAddr>) -> Option<String> {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(first_forwarded)
    {
        return Some(ip);
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let trimmed = real_ip.trim();
        if is_valid_ip(trimmed) {
            return Some(trimmed.to_string());
        }
    }

    socket_addr.map(|addr| addr.ip().to_string())
}

/// Same as [`client_ip`] but never empty, for log fields.
pub fn client_ip_or_unknown(headers: &HeaderMap, socket_addr: Option<&SocketAddr>) -> String {
    client_ip(headers, socket_addr).unwrap_or_else(|| "unknown".to_string())
}

fn first_forwarded(header_value: &str) -> Option<String> {
    header_value
        .split(',')
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .filter(|candidate| is_valid_ip(candidate))
        .map(str::to_string)
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}
