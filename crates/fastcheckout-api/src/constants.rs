//! Service-wide constants

use std::time::Duration;

pub const SERVICE_NAME: &str = "fastcheckout-api";

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound on request bodies. Checkout payloads are small JSON documents.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// How often expired rate-limit windows are swept.
pub const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Timeout for calls to Stripe and PayPal.
pub const PAYMENT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Session id reported when the caller did not send one.
pub const UNKNOWN_SESSION_ID: &str = "unknown";
