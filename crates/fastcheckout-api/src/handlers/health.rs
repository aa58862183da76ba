//! Health check handler

use crate::constants::SERVICE_VERSION;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use fastcheckout_core::ApiResponse;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ServiceChecks {
    pub linkbay: &'static str,
    pub stripe: &'static str,
    pub paypal: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the process started.
    pub uptime: f64,
    pub environment: String,
    pub version: &'static str,
    pub services: ServiceChecks,
}

fn configured(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "not_configured"
    }
}

/// Reports configuration status only; no outbound connectivity checks are made.
#[tracing::instrument(skip(state), fields(operation = "health_check"))]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let config = &state.config;
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_secs(),
        environment: config.environment.clone(),
        version: SERVICE_VERSION,
        services: ServiceChecks {
            linkbay: configured(state.core_api.is_configured()),
            stripe: configured(config.stripe_secret_key.is_some()),
            paypal: configured(config.paypal_client_id.is_some()),
        },
    }))
}
