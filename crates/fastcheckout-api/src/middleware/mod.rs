//! Request pipeline layers
//!
//! Tenant routes are wrapped, outermost first, in logging, tenant resolution,
//! rate limiting and CSRF. The CSRF and API-key layers live in
//! `fastcheckout_infra::middleware`.

pub mod logging;
pub mod rate_limit;
pub mod tenant;

pub use logging::logging_middleware;
pub use rate_limit::rate_limit_middleware;
pub use tenant::{tenant_middleware, TenantId, TENANT_HEADER};
