//! Test helpers: build AppState and router against mock upstreams.
//!
//! LinkBay, Stripe and PayPal are each replaced by a mockito server.
//! Run from workspace root: `cargo test -p fastcheckout-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::TestServer;
use fastcheckout_api::setup::{build_state, routes};
use fastcheckout_api::AppState;
use fastcheckout_core::Config;
use mockito::{Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

pub const TENANT_ID: &str = "0b6f1c9e-3a52-4c1e-9a43-2f1d5e7c8b90";
pub const API_KEY: &str = "test-linkbay-key";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Test application: server plus the mocks it talks to.
pub struct TestApp {
    pub server: TestServer,
    pub core: ServerGuard,
    pub stripe: ServerGuard,
    pub paypal: ServerGuard,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Setup test app with default configuration.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app, letting the caller adjust the configuration first.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let core = Server::new_async().await;
    let stripe = Server::new_async().await;
    let paypal = Server::new_async().await;

    let mut config = Config {
        linkbay_api_url: core.url(),
        linkbay_api_key: Some(API_KEY.to_string()),
        core_api_max_retries: 2,
        core_api_retry_base_delay: Duration::from_millis(1),
        core_api_timeout: Duration::from_secs(5),
        stripe_api_base: stripe.url(),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        paypal_api_base: Some(paypal.url()),
        ..Config::default()
    };
    customize(&mut config);

    let state = build_state(config).await.expect("Failed to build app state");
    let router = routes::setup_routes(state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        core,
        stripe,
        paypal,
        state,
    }
}

/// Wraps `data` in the Core API response envelope.
pub fn core_envelope(data: serde_json::Value) -> String {
    serde_json::json!({ "success": true, "data": data }).to_string()
}

/// Serves the tenant fixture from the mock Core API.
pub async fn mock_tenant(core: &mut ServerGuard, tenant: serde_json::Value) -> mockito::Mock {
    core.mock("GET", format!("/tenants/{}", TENANT_ID).as_str())
        .match_header("x-api-key", API_KEY)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(core_envelope(tenant))
        .create_async()
        .await
}

/// Accepts any number of webhook forwards.
pub async fn mock_webhook_events(core: &mut ServerGuard) -> mockito::Mock {
    core.mock("POST", "/webhooks/events")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(core_envelope(serde_json::Value::Null))
        .create_async()
        .await
}

/// Accepts any number of metric recordings for the test tenant.
pub async fn mock_metrics(core: &mut ServerGuard) -> mockito::Mock {
    core.mock("POST", format!("/tenants/{}/metrics", TENANT_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(core_envelope(serde_json::Value::Null))
        .create_async()
        .await
}
