//! HTTP middleware shared by API routes

pub mod api_key;
pub mod csrf;

pub use api_key::{api_key_middleware, ApiKeyConfig, API_KEY_HEADER};
pub use csrf::{
    csrf_cookie, csrf_middleware, generate_csrf_token, CsrfConfig, CSRF_COOKIE_NAME,
    CSRF_HEADER_NAME,
};
