//! Application setup and initialization
//!
//! Builds the shared state from configuration and wires it into the router.
//! Kept out of main.rs so tests can build the same app against mock upstreams.

pub mod routes;
pub mod server;

use crate::constants::{PAYMENT_PROVIDER_TIMEOUT, RATE_LIMIT_CLEANUP_INTERVAL};
use crate::state::AppState;
use anyhow::{Context, Result};
use fastcheckout_api_client::CoreApiClient;
use fastcheckout_core::Config;
use fastcheckout_infra::RateLimiter;
use fastcheckout_plugins::{register_builtin_plugins, PluginManager};
use std::sync::Arc;
use std::time::Instant;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let state = build_state(config).await?;

    state
        .rate_limiter
        .clone()
        .spawn_cleanup(RATE_LIMIT_CLEANUP_INTERVAL);

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}

/// Builds every singleton the handlers share. No background tasks are started.
pub async fn build_state(config: Config) -> Result<Arc<AppState>> {
    let core_api =
        CoreApiClient::from_config(&config).context("Failed to build Core API client")?;
    if !core_api.is_configured() {
        tracing::warn!("LINKBAY_API_KEY not set, Core API calls will be sent unauthenticated");
    }

    let plugins = PluginManager::new()
        .with_failure_policy(config.plugin_failure_policy)
        .with_hook_timeout(config.plugin_hook_timeout);
    register_builtin_plugins(&plugins, &config.enabled_plugins).await;

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window,
        config.rate_limit_max_entries,
    ));

    let http = reqwest::Client::builder()
        .timeout(PAYMENT_PROVIDER_TIMEOUT)
        .build()
        .context("Failed to build payment provider HTTP client")?;

    tracing::info!(
        environment = %config.environment,
        plugin_failure_policy = %config.plugin_failure_policy,
        rate_limit_max_requests = config.rate_limit_max_requests,
        rate_limit_window_secs = config.rate_limit_window.as_secs(),
        csrf_protection = config.csrf_protection,
        "Application state initialized"
    );

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        core_api,
        plugins,
        rate_limiter,
        http,
        started_at: Instant::now(),
    }))
}
