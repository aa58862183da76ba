//! Payment processor adapters.
//!
//! Both adapters are thin translators over the processors' REST APIs. They are
//! built per request from the tenant's credentials and hold no state besides a
//! shared `reqwest::Client`. Nothing here retries: a failed processor call is
//! reported to the caller as is.

pub mod error;
pub mod paypal;
pub mod stripe;

pub use error::{PaymentError, Provider};
pub use paypal::{CreatePayPalOrder, PayPalCapture, PayPalClient, PayPalOrder};
pub use stripe::{
    CreatePaymentIntent, PaymentIntent, StripeClient, StripeEvent, StripeEventKind,
    WebhookVerifier,
};
