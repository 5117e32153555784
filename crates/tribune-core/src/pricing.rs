//! # Line Pricing
//!
//! Pricing math shared by the cart view, checkout and payment flows.
//!
//! ## Pricing Pipeline (per line item)
//! ```text
//! list price
//!     │  × (1 - product discount %)
//!     ▼
//! unit price ────────────────────────► Σ unit × qty = ORDER TOTAL (stored)
//!     │  × (1 - tier discount %)
//!     ▼
//! discounted unit price ─────────────► displayed / charged figures
//! ```
//!
//! The stored order total deliberately EXCLUDES the tier discount: the
//! pre-discount sum plus the captured discount percent lets the same order
//! be redisplayed consistently even if tier rules change later, while the
//! original amount remains an audit-safe record.

use serde::Serialize;

use crate::money::Money;

/// The priced figures for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinePricing {
    /// List price after the product's own discount.
    pub unit_price: Money,

    /// Unit price after the loyalty tier discount on top.
    pub discounted_unit_price: Money,

    /// `unit_price × quantity`; contributes to the stored order total.
    pub undiscounted_line_total: Money,

    /// `discounted_unit_price × quantity`; the figure shown to the client.
    pub line_total: Money,
}

/// Prices one line item.
///
/// ## Example
/// ```rust
/// use tribune_core::money::Money;
/// use tribune_core::pricing::price_line;
///
/// // 15 000 F jersey, 20% product promo, FANA tier (10%), 2 units
/// let line = price_line(Money::from_francs(15_000), 20, 10, 2);
/// assert_eq!(line.unit_price.francs(), 12_000);
/// assert_eq!(line.discounted_unit_price.francs(), 10_800);
/// assert_eq!(line.undiscounted_line_total.francs(), 24_000);
/// assert_eq!(line.line_total.francs(), 21_600);
/// ```
pub fn price_line(
    list_price: Money,
    product_discount_pct: u8,
    tier_discount_pct: u8,
    quantity: i64,
) -> LinePricing {
    let unit_price = list_price.apply_discount_pct(product_discount_pct);
    let discounted_unit_price = unit_price.apply_discount_pct(tier_discount_pct);

    LinePricing {
        unit_price,
        discounted_unit_price,
        undiscounted_line_total: unit_price.multiply_quantity(quantity),
        line_total: discounted_unit_price.multiply_quantity(quantity),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_discounts() {
        let line = price_line(Money::from_francs(1_000), 0, 0, 1);
        assert_eq!(line.unit_price.francs(), 1_000);
        assert_eq!(line.line_total.francs(), 1_000);
        assert_eq!(line.undiscounted_line_total.francs(), 1_000);
    }

    #[test]
    fn test_tier_discount_excluded_from_undiscounted_total() {
        // 1 000 F item, no product promo, 10% tier: the stored total keeps
        // the full 1 000 while the displayed figure drops to 900.
        let line = price_line(Money::from_francs(1_000), 0, 10, 1);
        assert_eq!(line.undiscounted_line_total.francs(), 1_000);
        assert_eq!(line.line_total.francs(), 900);
    }

    #[test]
    fn test_product_discount_applies_before_tier() {
        let line = price_line(Money::from_francs(10_000), 25, 20, 1);
        assert_eq!(line.unit_price.francs(), 7_500);
        assert_eq!(line.discounted_unit_price.francs(), 6_000);
    }

    #[test]
    fn test_quantity_multiplies_after_unit_rounding() {
        // Unit rounds once, then multiplies: 999 at 7% -> 929 per unit
        let line = price_line(Money::from_francs(999), 7, 0, 3);
        assert_eq!(line.unit_price.francs(), 929);
        assert_eq!(line.undiscounted_line_total.francs(), 2_787);
    }
}
