//! Validation helpers shared by models and request handlers.

use regex::Regex;
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::ValidationError;

/// Canonical 8-4-4-4-12 hexadecimal form, any case.
static TENANT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap_or_else(|e| panic!("invalid tenant id pattern: {e}"))
});

pub static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{1,4}[)]?[-\s.]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{1,9}$")
        .unwrap_or_else(|e| panic!("invalid phone pattern: {e}"))
});

static CURRENCY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{3}$").unwrap_or_else(|e| panic!("invalid currency pattern: {e}"))
});

/// True only for the canonical hyphenated UUID shape.
///
/// `Uuid::parse_str` alone also accepts braced, URN and simple forms, which the
/// tenant header must not.
pub fn is_valid_tenant_id(value: &str) -> bool {
    TENANT_ID_REGEX.is_match(value)
}

/// Validates the tenant header value and parses it.
pub fn parse_tenant_id(value: &str) -> Option<Uuid> {
    if !is_valid_tenant_id(value) {
        return None;
    }
    Uuid::parse_str(value).ok()
}

/// Escapes the five characters that matter for HTML injection.
///
/// `&` is left alone, so already-escaped text passes through unchanged.
pub fn sanitize_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Largest amount accepted for a payment or a line price, in minor units.
pub const MAX_AMOUNT_MINOR_UNITS: i64 = 99_999_999_999;

pub fn max_amount() -> Decimal {
    Decimal::new(MAX_AMOUNT_MINOR_UNITS, 2)
}

pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if !value.is_sign_positive() || value.is_zero() {
        return Err(ValidationError::new("positive")
            .with_message(Cow::Borrowed("Amount must be positive")));
    }
    if *value > max_amount() {
        return Err(ValidationError::new("max_amount")
            .with_message(Cow::Owned(format!("Amount must not exceed {}", max_amount()))));
    }
    Ok(())
}

pub fn validate_currency_code(value: &str) -> Result<(), ValidationError> {
    if CURRENCY_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("currency")
            .with_message(Cow::Borrowed("Currency must be a 3-letter code")))
    }
}
