//! Order summary pricing.
//!
//! Pure functions over cart lines. Nothing here rounds: the summary keeps
//! full precision and [`Price::display`] rounds when it is shown.

use rust_decimal::Decimal;
use serde::Serialize;

use woala_core::Price;

use crate::cart::CartItem;

/// Tax and shipping constants applied to every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rates {
    /// Fraction of the subtotal charged as tax (0.08 = 8%).
    pub tax_rate: Decimal,
    /// Flat shipping charge per order.
    pub shipping_flat: Price,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            shipping_flat: Price::from_cents(999),
        }
    }
}

/// Derived pricing breakdown for a cart. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub total: Price,
}

/// Compute subtotal, tax, shipping and total for `items`.
#[must_use]
pub fn compute_summary(items: &[CartItem], rates: &Rates) -> OrderSummary {
    let subtotal: Price = items.iter().map(CartItem::line_total).sum();
    let tax = subtotal.scaled(rates.tax_rate);
    let shipping = rates.shipping_flat;

    OrderSummary {
        subtotal,
        tax,
        shipping,
        total: subtotal + shipping + tax,
    }
}
