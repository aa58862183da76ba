//! Route configuration and setup.

use crate::constants::MAX_REQUEST_BODY_BYTES;
use crate::handlers::{analytics, csrf, fallback, health, paypal, plugins, stripe};
use crate::middleware::{logging_middleware, rate_limit_middleware, tenant_middleware};
use crate::state::AppState;
use axum::{
    handler::Handler,
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use fastcheckout_core::Config;
use fastcheckout_infra::{api_key_middleware, csrf_middleware, ApiKeyConfig, CsrfConfig};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = state.config.clone();
    let cors = setup_cors(&config)?;

    let app = Router::new()
        .merge(public_routes())
        .merge(tenant_routes(&state, &config))
        .merge(admin_routes(&config))
        .fallback(fallback::not_found)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Routes with no tenant: health, CSRF token issuance and the Stripe webhook
/// (which carries its tenant in the event metadata).
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/csrf-token", get(csrf::issue_csrf_token))
        .route("/api/stripe/webhook", post(stripe::stripe_webhook))
}

/// Tenant-scoped routes. Requests pass, in order: request logging, tenant
/// resolution, rate limiting, CSRF check.
fn tenant_routes(state: &Arc<AppState>, config: &Config) -> Router<Arc<AppState>> {
    let csrf_config = Arc::new(CsrfConfig {
        enabled: config.csrf_protection,
        secure_cookie: config.is_production(),
    });

    Router::new()
        .route(
            "/api/analytics/checkout",
            get(analytics::get_checkout_analytics),
        )
        .route(
            "/api/stripe/payment-intent",
            post(stripe::create_payment_intent),
        )
        .route("/api/paypal/create-order", post(paypal::create_order))
        .route("/api/paypal/capture-order", post(paypal::capture_order))
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn(logging_middleware))
                .layer(from_fn(tenant_middleware))
                .layer(from_fn_with_state(
                    state.rate_limiter.clone(),
                    rate_limit_middleware,
                ))
                .layer(from_fn_with_state(csrf_config, csrf_middleware)),
        )
}

/// Operator routes guarded by the service API key. The handler is wrapped
/// directly; the last `layer` call is the outermost.
fn admin_routes(config: &Config) -> Router<Arc<AppState>> {
    let api_key_config = Arc::new(ApiKeyConfig::new(config.linkbay_api_key.clone()));

    Router::new().route(
        "/api/plugins",
        get(plugins::list_plugins
            .layer(from_fn_with_state(api_key_config, api_key_middleware))
            .layer(from_fn(logging_middleware))),
    )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
