//! Application state shared by every handler.
//!
//! Everything here is built once in `setup` and injected; there are no
//! process-wide globals.

use fastcheckout_api_client::CoreApiClient;
use fastcheckout_core::Config;
use fastcheckout_infra::RateLimiter;
use fastcheckout_plugins::PluginManager;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub core_api: CoreApiClient,
    pub plugins: PluginManager,
    pub rate_limiter: Arc<RateLimiter>,
    /// Shared client for Stripe and PayPal; tenants bring their own credentials.
    pub http: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
