//! FastCheckout Core Library
//!
//! Domain models, error types, configuration, validation and the checkout
//! session store shared by every FastCheckout crate.

pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod pricing;
pub mod response;
pub mod session_store;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, HookFailurePolicy};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use ids::{generate_order_number, generate_session_id};
pub use pricing::{calculate_cart_totals, CartTotals};
pub use response::{ApiError, ApiResponse};
pub use session_store::{
    CheckoutSessionStore, FileStorage, MemoryStorage, SessionStorage, SESSION_STORAGE_KEY,
};
