//! Stripe adapter: payment intents over the REST API and webhook handling.

mod client;
mod webhook;

pub use client::{
    metadata_to_strings, CreatePaymentIntent, LastPaymentError, PaymentIntent, StripeClient,
    TENANT_METADATA_KEY,
};
pub use webhook::{
    compute_signature, parse_signature_header, Charge, StripeEvent, StripeEventKind,
    WebhookVerifier,
};
