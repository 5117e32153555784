//! # Points Accrual Policy
//!
//! Maps a paid amount in the base currency to a loyalty point award.
//!
//! ## Accrual Bands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  amount (XOF)            points                                         │
//! │  ───────────────────     ──────                                         │
//! │        < 15 000            20                                           │
//! │        < 50 000            50                                           │
//! │        < 100 000           100                                          │
//! │        < 150 000           150                                          │
//! │        < 300 000           300                                          │
//! │        < 500 000           500                                          │
//! │        ≥ 500 000           1000                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bands are left-inclusive on the lower bound: an amount of exactly
//! 15 000 already earns 50 points.
//!
//! Conversion of non-XOF amounts happens in the service layer (it needs
//! the rate provider); this module only bands base-currency amounts.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Accrual bands as (exclusive upper bound in XOF, points awarded).
pub const ACCRUAL_BANDS: [(i64, i64); 6] = [
    (15_000, 20),
    (50_000, 50),
    (100_000, 100),
    (150_000, 150),
    (300_000, 300),
    (500_000, 500),
];

/// Points for amounts at or above the top band.
pub const TOP_BAND_POINTS: i64 = 1_000;

/// Computes the loyalty points earned for a base-currency payment amount.
///
/// ## Errors
/// `InvalidAmount` when the amount is negative. Zero is a valid amount
/// (a fully-discounted order still earns the bottom band).
///
/// ## Example
/// ```rust
/// use tribune_core::money::Money;
/// use tribune_core::points::points_for_amount;
///
/// assert_eq!(points_for_amount(Money::from_francs(14_999)).unwrap(), 20);
/// assert_eq!(points_for_amount(Money::from_francs(15_000)).unwrap(), 50);
/// ```
pub fn points_for_amount(amount: Money) -> CoreResult<i64> {
    if amount.is_negative() {
        return Err(CoreError::InvalidAmount {
            amount: amount.francs(),
        });
    }

    let francs = amount.francs();
    for (bound, points) in ACCRUAL_BANDS {
        if francs < bound {
            return Ok(points);
        }
    }
    Ok(TOP_BAND_POINTS)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(points_for_amount(Money::from_francs(0)).unwrap(), 20);
        assert_eq!(points_for_amount(Money::from_francs(14_999)).unwrap(), 20);
        assert_eq!(points_for_amount(Money::from_francs(15_000)).unwrap(), 50);
        assert_eq!(points_for_amount(Money::from_francs(49_999)).unwrap(), 50);
        assert_eq!(points_for_amount(Money::from_francs(50_000)).unwrap(), 100);
        assert_eq!(points_for_amount(Money::from_francs(100_000)).unwrap(), 150);
        assert_eq!(points_for_amount(Money::from_francs(150_000)).unwrap(), 300);
        assert_eq!(points_for_amount(Money::from_francs(300_000)).unwrap(), 500);
        assert_eq!(points_for_amount(Money::from_francs(499_999)).unwrap(), 500);
        assert_eq!(points_for_amount(Money::from_francs(500_000)).unwrap(), 1_000);
        assert_eq!(
            points_for_amount(Money::from_francs(12_000_000)).unwrap(),
            1_000
        );
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let err = points_for_amount(Money::from_francs(-1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { amount: -1 }));
    }
}
