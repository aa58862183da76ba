use rust_decimal::Decimal;
use std::fmt::{self, Display};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Stripe,
    PayPal,
}

impl Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Stripe => f.write_str("Stripe"),
            Provider::PayPal => f.write_str("PayPal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor answered with a non-2xx status.
    #[error("{message}")]
    Api {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("Failed to authenticate with {0}")]
    Authentication(Provider),

    #[error("{provider} request failed: {source}")]
    Http {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected {provider} response: {message}")]
    InvalidResponse { provider: Provider, message: String },

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Webhook signature verification failed: {0}")]
    Signature(String),

    #[error("Invalid webhook payload: {0}")]
    Payload(String),
}

impl PaymentError {
    pub(crate) fn http(provider: Provider) -> impl FnOnce(reqwest::Error) -> PaymentError {
        move |source| PaymentError::Http { provider, source }
    }

    pub fn provider(&self) -> Option<Provider> {
        match self {
            PaymentError::Api { provider, .. }
            | PaymentError::Http { provider, .. }
            | PaymentError::InvalidResponse { provider, .. }
            | PaymentError::Authentication(provider) => Some(*provider),
            _ => None,
        }
    }
}
