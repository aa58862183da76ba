//! Plugin listing handler

use crate::state::AppState;
use axum::{extract::State, Json};
use fastcheckout_core::ApiResponse;
use fastcheckout_plugins::PluginInfo;
use std::sync::Arc;

/// Registered plugins in invocation order.
#[tracing::instrument(skip(state), fields(operation = "list_plugins"))]
pub async fn list_plugins(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<PluginInfo>>> {
    Json(ApiResponse::ok(state.plugins.list().await))
}
