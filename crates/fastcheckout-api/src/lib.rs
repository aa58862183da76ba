//! FastCheckout API Library
//!
//! HTTP handlers, the tenant-scoped request pipeline and application setup
//! for the checkout service.

pub mod constants;
pub mod error;
mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
mod utils;

pub use error::{HttpAppError, JsonBody};
pub use state::AppState;
