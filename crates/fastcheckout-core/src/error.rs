//! Error types module
//!
//! All failures a checkout request can surface are unified under [`AppError`].
//! Each variant describes its own HTTP presentation through [`ErrorMetadata`], so the
//! API layer can render the uniform response envelope without matching on variants.

use serde_json::{json, Map, Value as JsonValue};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected client mistakes (missing headers, bad input)
    Debug,
    /// Rejections worth noticing (rate limits, upstream refusals)
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "MISSING_TENANT_ID")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Structured details attached to the envelope, if any
    fn details(&self) -> Option<JsonValue>;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("X-Tenant-ID header is missing")]
    MissingTenantId,

    #[error("X-Tenant-ID header is not a canonical UUID")]
    InvalidTenantId,

    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Checkout validation failed: {}", .0.join("; "))]
    CheckoutValidationFailed(Vec<String>),

    #[error("Stripe is not enabled for this tenant")]
    StripeNotEnabled,

    #[error("PayPal is not enabled for this tenant")]
    PayPalNotEnabled,

    #[error("Stripe error: {0}")]
    Stripe(String),

    #[error("PayPal error: {0}")]
    PayPal(String),

    #[error("Missing stripe-signature header")]
    MissingSignature,

    #[error("Stripe webhook secret is not configured")]
    WebhookNotConfigured,

    #[error("Webhook event carries no tenantId metadata")]
    WebhookMissingTenantId,

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Analytics error: {0}")]
    Analytics(String),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Invalid or missing API key")]
    InvalidApiKey,

    #[error("CSRF token validation failed")]
    CsrfValidationFailed,

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payment intent creation failed: {0}")]
    PaymentIntentFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::MissingTenantId => (400, "MISSING_TENANT_ID", false, LogLevel::Debug),
        AppError::InvalidTenantId => (400, "INVALID_TENANT_ID", false, LogLevel::Debug),
        AppError::MissingParameters(_) => (400, "MISSING_PARAMETERS", false, LogLevel::Debug),
        AppError::InvalidDateFormat(_) => (400, "INVALID_DATE_FORMAT", false, LogLevel::Debug),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, LogLevel::Debug),
        AppError::CheckoutValidationFailed(_) => {
            (400, "CHECKOUT_VALIDATION_FAILED", false, LogLevel::Debug)
        }
        AppError::StripeNotEnabled => (400, "STRIPE_NOT_ENABLED", false, LogLevel::Debug),
        AppError::PayPalNotEnabled => (400, "PAYPAL_NOT_ENABLED", false, LogLevel::Debug),
        AppError::Stripe(_) => (400, "STRIPE_ERROR", false, LogLevel::Warn),
        AppError::PayPal(_) => (500, "PAYPAL_ERROR", false, LogLevel::Error),
        AppError::MissingSignature => (400, "MISSING_SIGNATURE", false, LogLevel::Debug),
        AppError::WebhookNotConfigured => (500, "WEBHOOK_NOT_CONFIGURED", false, LogLevel::Error),
        AppError::WebhookMissingTenantId => (400, "MISSING_TENANT_ID", false, LogLevel::Warn),
        AppError::Webhook(_) => (400, "WEBHOOK_ERROR", false, LogLevel::Warn),
        AppError::Analytics(_) => (500, "ANALYTICS_ERROR", true, LogLevel::Error),
        AppError::HealthCheckFailed(_) => (503, "HEALTH_CHECK_FAILED", true, LogLevel::Error),
        AppError::InvalidApiKey => (401, "INVALID_API_KEY", false, LogLevel::Debug),
        AppError::CsrfValidationFailed => (403, "CSRF_VALIDATION_FAILED", false, LogLevel::Debug),
        AppError::RateLimitExceeded { .. } => (429, "RATE_LIMIT_EXCEEDED", false, LogLevel::Warn),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::PaymentIntentFailed(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

/// Flattens validator output into `{ field: [message, ...] }`.
fn validation_details(errors: &validator::ValidationErrors) -> JsonValue {
    let mut fields = Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<JsonValue> = field_errors
            .iter()
            .map(|e| {
                let text = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                JsonValue::String(text)
            })
            .collect();
        fields.insert(field.to_string(), JsonValue::Array(messages));
    }
    JsonValue::Object(fields)
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MissingTenantId => "X-Tenant-ID header is required".to_string(),
            AppError::InvalidTenantId => "X-Tenant-ID must be a valid UUID".to_string(),
            AppError::MissingParameters(msg)
            | AppError::InvalidDateFormat(msg)
            | AppError::InvalidInput(msg)
            | AppError::Stripe(msg)
            | AppError::PayPal(msg)
            | AppError::Webhook(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(_) => "Invalid request data".to_string(),
            AppError::CheckoutValidationFailed(_) => "Checkout validation failed".to_string(),
            AppError::StripeNotEnabled => "Stripe is not enabled for this tenant".to_string(),
            AppError::PayPalNotEnabled => "PayPal is not enabled for this tenant".to_string(),
            AppError::MissingSignature => "Missing stripe-signature header".to_string(),
            AppError::WebhookNotConfigured => "Webhook secret not configured".to_string(),
            AppError::WebhookMissingTenantId => "Missing tenantId in event metadata".to_string(),
            AppError::Analytics(_) => "Failed to fetch analytics".to_string(),
            AppError::HealthCheckFailed(_) => "Health check failed".to_string(),
            AppError::InvalidApiKey => "Invalid or missing API key".to_string(),
            AppError::CsrfValidationFailed => "CSRF token validation failed".to_string(),
            AppError::RateLimitExceeded { .. } => {
                "Too many requests, please try again later".to_string()
            }
            AppError::PaymentIntentFailed(_) => "Failed to create payment intent".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn details(&self) -> Option<JsonValue> {
        match self {
            AppError::Validation(errors) => Some(validation_details(errors)),
            AppError::CheckoutValidationFailed(errors) => Some(json!(errors)),
            AppError::RateLimitExceeded { retry_after_secs } => {
                Some(json!({ "retryAfter": retry_after_secs }))
            }
            AppError::Analytics(msg)
            | AppError::HealthCheckFailed(msg)
            | AppError::PaymentIntentFailed(msg)
            | AppError::Internal(msg) => Some(JsonValue::String(msg.clone())),
            AppError::InternalWithSource { message, .. } => {
                Some(JsonValue::String(message.clone()))
            }
            _ => None,
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}

impl AppError {
    /// Short variant name used as a structured log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MissingTenantId => "MissingTenantId",
            AppError::InvalidTenantId => "InvalidTenantId",
            AppError::MissingParameters(_) => "MissingParameters",
            AppError::InvalidDateFormat(_) => "InvalidDateFormat",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Validation(_) => "Validation",
            AppError::CheckoutValidationFailed(_) => "CheckoutValidationFailed",
            AppError::StripeNotEnabled => "StripeNotEnabled",
            AppError::PayPalNotEnabled => "PayPalNotEnabled",
            AppError::Stripe(_) => "Stripe",
            AppError::PayPal(_) => "PayPal",
            AppError::MissingSignature => "MissingSignature",
            AppError::WebhookNotConfigured => "WebhookNotConfigured",
            AppError::WebhookMissingTenantId => "WebhookMissingTenantId",
            AppError::Webhook(_) => "Webhook",
            AppError::Analytics(_) => "Analytics",
            AppError::HealthCheckFailed(_) => "HealthCheckFailed",
            AppError::InvalidApiKey => "InvalidApiKey",
            AppError::CsrfValidationFailed => "CsrfValidationFailed",
            AppError::RateLimitExceeded { .. } => "RateLimitExceeded",
            AppError::NotFound(_) => "NotFound",
            AppError::PaymentIntentFailed(_) => "PaymentIntentFailed",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "InternalWithSource",
        }
    }

    /// Seconds a client should wait before retrying, for rate-limit rejections.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AppError::RateLimitExceeded { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SignupForm {
        #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
        first_name: String,
    }

    #[test]
    fn test_tenant_errors_map_to_400() {
        assert_eq!(AppError::MissingTenantId.http_status_code(), 400);
        assert_eq!(AppError::MissingTenantId.error_code(), "MISSING_TENANT_ID");
        assert_eq!(AppError::InvalidTenantId.error_code(), "INVALID_TENANT_ID");
        assert_eq!(
            AppError::InvalidTenantId.client_message(),
            "X-Tenant-ID must be a valid UUID"
        );
    }

    #[test]
    fn test_webhook_tenant_error_shares_code_with_header_error() {
        assert_eq!(
            AppError::WebhookMissingTenantId.error_code(),
            AppError::MissingTenantId.error_code()
        );
        assert_ne!(
            AppError::WebhookMissingTenantId.client_message(),
            AppError::MissingTenantId.client_message()
        );
    }

    #[test]
    fn test_rate_limit_metadata() {
        let err = AppError::RateLimitExceeded {
            retry_after_secs: 42,
        };
        assert_eq!(err.http_status_code(), 429);
        assert_eq!(err.retry_after_secs(), Some(42));
        assert_eq!(err.details(), Some(json!({ "retryAfter": 42 })));
    }

    #[test]
    fn test_validation_details_are_field_level() {
        let form = SignupForm {
            first_name: "A".to_string(),
        };
        let err: AppError = form.validate().unwrap_err().into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        let details = err.details().unwrap();
        assert_eq!(
            details["first_name"][0],
            "First name must be at least 2 characters"
        );
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::Internal("db exploded".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert_eq!(err.details(), Some(json!("db exploded")));

        let err = AppError::PaymentIntentFailed("timeout".to_string());
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(err.client_message(), "Failed to create payment intent");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.error_type(), "InternalWithSource");
        assert_eq!(err.http_status_code(), 500);
    }
}
