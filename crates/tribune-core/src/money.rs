//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Francs                                           │
//! │    XOF (the settlement currency) has no minor unit, so every stored    │
//! │    amount is a whole number of francs in an i64.                       │
//! │    Discounts round once, explicitly, at the point they are applied.    │
//! │                                                                         │
//! │  Foreign-currency figures (EUR/USD) are display-only conversions       │
//! │  produced by the rate provider and are never stored.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tribune_core::money::Money;
//!
//! let price = Money::from_francs(15_000);
//!
//! // Tier discount of 10% (1000 basis points)
//! let discounted = price.apply_discount_bps(1_000);
//! assert_eq!(discounted.francs(), 13_500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole XOF francs.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for reversals and deltas
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every stored amount in the system (list prices, order totals, payment
/// amounts, accrual thresholds) flows through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole francs.
    #[inline]
    pub const fn from_francs(francs: i64) -> Self {
        Money(francs)
    }

    /// Returns the value in francs.
    #[inline]
    pub const fn francs(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tribune_core::money::Money;
    ///
    /// let unit_price = Money::from_francs(12_000);
    /// assert_eq!(unit_price.multiply_quantity(3).francs(), 36_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount given in basis points and returns the
    /// discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    ///
    /// ## Implementation
    /// Integer math with half-up rounding of the discount amount:
    /// `discount = (amount * bps + 5000) / 10000`. i128 widening prevents
    /// overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use tribune_core::money::Money;
    ///
    /// let total = Money::from_francs(1_000);
    /// assert_eq!(total.apply_discount_bps(1_000).francs(), 900); // 10% off
    /// ```
    pub fn apply_discount_bps(&self, discount_bps: u32) -> Money {
        let discount = (self.0 as i128 * discount_bps as i128 + 5000) / 10000;
        Money(self.0 - discount as i64)
    }

    /// Applies a whole-percent discount.
    ///
    /// Discount percentages in Tribune (product discounts, loyalty tier
    /// reductions) are whole percents between 0 and 100; this converts to
    /// basis points and delegates to [`Money::apply_discount_bps`].
    #[inline]
    pub fn apply_discount_pct(&self, discount_pct: u8) -> Money {
        self.apply_discount_bps(discount_pct as u32 * 100)
    }

    /// Returns the amount as an f64 for display-only currency conversion.
    ///
    /// Stored values stay integral; only the converted EUR/USD figures
    /// handed back to clients pass through floating point.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Client-facing formatting (including the
/// EUR/USD conversions) is handled by the API layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} F CFA", self.0)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_francs() {
        let money = Money::from_francs(15_000);
        assert_eq!(money.francs(), 15_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_francs(1500)), "1500 F CFA");
        assert_eq!(format!("{}", Money::from_francs(0)), "0 F CFA");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_francs(10_000);
        let b = Money::from_francs(2_500);

        assert_eq!((a + b).francs(), 12_500);
        assert_eq!((a - b).francs(), 7_500);
        assert_eq!((a * 3).francs(), 30_000);
    }

    #[test]
    fn test_discount_bps() {
        let total = Money::from_francs(10_000);
        assert_eq!(total.apply_discount_bps(1_000).francs(), 9_000); // 10%
        assert_eq!(total.apply_discount_bps(2_500).francs(), 7_500); // 25%
        assert_eq!(total.apply_discount_bps(0).francs(), 10_000);
    }

    #[test]
    fn test_discount_pct_rounds_half_up() {
        // 7% of 999 = 69.93 -> discount rounds to 70
        let price = Money::from_francs(999);
        assert_eq!(price.apply_discount_pct(7).francs(), 929);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        let negative = Money::from_francs(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_francs(12_000);
        assert_eq!(unit_price.multiply_quantity(3).francs(), 36_000);
    }
}
