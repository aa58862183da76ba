//! FastCheckout Infrastructure Library
//!
//! Shared infrastructure used by the checkout API:
//! - Middleware (CSRF double-submit check, API key check)
//! - Fixed-window rate limiting
//! - Retry with exponential backoff for outbound calls
//! - Telemetry initialization
//! - Error envelope rendering

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

#[cfg(feature = "retry")]
pub mod retry;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    api_key_middleware, csrf_middleware, generate_csrf_token, ApiKeyConfig, CsrfConfig,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

pub use error::envelope_response;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{RateLimitDecision, RateLimiter};

#[cfg(feature = "retry")]
pub use retry::{retry_with_backoff, retry_with_backoff_if, RetryPolicy};
