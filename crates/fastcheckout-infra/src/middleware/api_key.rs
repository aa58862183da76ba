//! Static API key check for operator endpoints.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use fastcheckout_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::envelope_response;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct ApiKeyConfig {
    /// With no key configured every request is rejected.
    pub expected: Option<String>,
}

impl ApiKeyConfig {
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }

    /// Constant-time comparison against the configured key.
    pub fn accepts(&self, provided: Option<&str>) -> bool {
        match (self.expected.as_deref(), provided) {
            (Some(expected), Some(provided)) if !expected.is_empty() => {
                expected.as_bytes().ct_eq(provided.as_bytes()).into()
            }
            _ => false,
        }
    }
}

pub async fn api_key_middleware(
    State(config): State<Arc<ApiKeyConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if !config.accepts(provided) {
        tracing::debug!(
            path = %request.uri().path(),
            has_key = provided.is_some(),
            "Rejected request with invalid API key"
        );
        return envelope_response(&AppError::InvalidApiKey, false);
    }

    next.run(request).await
}
