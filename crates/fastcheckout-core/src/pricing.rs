//! Cart arithmetic.
//!
//! Amounts are `Decimal` so two-place rounding is exact. Each figure is rounded
//! half away from zero to two decimal places independently. All arithmetic is
//! checked: a figure outside `Decimal`'s range yields `None` rather than a panic.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::CartItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `None` if any line, the subtotal, the tax or the total overflows.
pub fn calculate_cart_totals(
    items: &[CartItem],
    tax_rate: Decimal,
    shipping: Decimal,
) -> Option<CartTotals> {
    let subtotal = items.iter().try_fold(Decimal::ZERO, |acc, item| {
        item.price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| acc.checked_add(line))
    })?;
    let tax = subtotal.checked_mul(tax_rate)?;
    let total = subtotal.checked_add(tax)?.checked_add(shipping)?;

    Some(CartTotals {
        subtotal: round2(subtotal),
        tax: round2(tax),
        shipping: round2(shipping),
        total: round2(total),
    })
}

/// Converts a major-unit amount to the processor's minor units (cents).
///
/// `None` when the result does not fit an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    round2(amount).checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

/// Converts processor minor units back to a major-unit amount.
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}
