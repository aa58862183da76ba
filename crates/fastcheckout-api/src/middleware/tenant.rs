//! Tenant resolution
//!
//! Every tenant route requires an `X-Tenant-ID` header holding a canonical
//! UUID. The resolved id is stored as a request extension and read back by
//! handlers through the [`TenantId`] extractor.

use crate::error::HttpAppError;
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fastcheckout_core::{validation::parse_tenant_id, AppError};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use uuid::Uuid;

pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantId(pub Uuid);

/// Reads and validates the tenant header.
pub fn resolve_tenant(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(TENANT_HEADER)
        .ok_or(AppError::MissingTenantId)?
        .to_str()
        .map_err(|_| AppError::InvalidTenantId)?;

    if value.is_empty() {
        return Err(AppError::MissingTenantId);
    }

    parse_tenant_id(value).ok_or(AppError::InvalidTenantId)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Rejects requests without a valid tenant and turns a panicking handler into
/// a 500 envelope.
pub async fn tenant_middleware(mut request: Request, next: Next) -> Response {
    let tenant_id = match resolve_tenant(request.headers()) {
        Ok(id) => id,
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(TenantId(tenant_id));

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(tenant_id = %tenant_id, error = %message, "Handler panicked");
            HttpAppError(AppError::Internal(message)).into_response()
        }
    }
}

impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(tenant) = parts.extensions.get::<TenantId>() {
            return Ok(*tenant);
        }
        resolve_tenant(&parts.headers)
            .map(TenantId)
            .map_err(HttpAppError)
    }
}
