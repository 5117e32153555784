//! # Loyalty Tier Engine
//!
//! Maps accumulated loyalty points to a tier, its benefits, and progress
//! toward the next tier.
//!
//! ## Tier Ladder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  points:   0      500     1500     3000      7000         15000        │
//! │            │       │        │        │         │             │          │
//! │            ▼       ▼        ▼        ▼         ▼             ▼          │
//! │          GBAO  Supporteur  FANA  VRAI FANA  CR7 VS MESSI   GOAT        │
//! │  disc:    0%      5%       10%      15%       20%           25%        │
//! │  ship:    -       -        -        -         2 free        4 free     │
//! │  item:    -       -        -        -         1 free        2 free     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selection is the HIGHEST tier whose threshold is ≤ the point total.
//! Pure function: no persistence, no clock, deterministic for a given input.

use serde::{Deserialize, Serialize};

// =============================================================================
// Referral Bonus Constants
// =============================================================================

/// Points granted to the referrer when their code is redeemed.
pub const REFERRER_BONUS: i64 = 75;

/// Points granted to the new customer redeeming a referral code.
pub const REFEREE_BONUS: i64 = 25;

// =============================================================================
// Tier Table
// =============================================================================

/// The benefit bundle unlocked by a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBenefits {
    /// Discount applied to priced carts and orders, whole percent.
    pub discount_pct: u8,
    /// Free shipping vouchers per season.
    pub free_shipping: u8,
    /// Free jerseys per season.
    pub free_items: u8,
}

/// A loyalty tier: a name, the point threshold that unlocks it, and its
/// benefits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub name: &'static str,
    pub threshold: i64,
    pub benefits: TierBenefits,
}

/// Fixed, ascending tier table.
///
/// Order matters: selection walks this table and keeps the last tier whose
/// threshold is satisfied, so ties resolve to the higher tier.
pub static TIERS: [Tier; 6] = [
    Tier {
        name: "GBAO",
        threshold: 0,
        benefits: TierBenefits {
            discount_pct: 0,
            free_shipping: 0,
            free_items: 0,
        },
    },
    Tier {
        name: "Supporteur",
        threshold: 500,
        benefits: TierBenefits {
            discount_pct: 5,
            free_shipping: 0,
            free_items: 0,
        },
    },
    Tier {
        name: "FANA",
        threshold: 1500,
        benefits: TierBenefits {
            discount_pct: 10,
            free_shipping: 0,
            free_items: 0,
        },
    },
    Tier {
        name: "VRAI FANA",
        threshold: 3000,
        benefits: TierBenefits {
            discount_pct: 15,
            free_shipping: 0,
            free_items: 0,
        },
    },
    Tier {
        name: "CR7 VS MESSI",
        threshold: 7000,
        benefits: TierBenefits {
            discount_pct: 20,
            free_shipping: 2,
            free_items: 1,
        },
    },
    Tier {
        name: "GOAT",
        threshold: 15000,
        benefits: TierBenefits {
            discount_pct: 25,
            free_shipping: 4,
            free_items: 2,
        },
    },
];

// =============================================================================
// Level Computation
// =============================================================================

/// The result of mapping a point total onto the tier ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelInfo {
    /// The highest tier whose threshold is ≤ the point total.
    pub current: &'static Tier,

    /// The next tier up, or `None` at the top of the ladder.
    pub next: Option<&'static Tier>,

    /// Progress toward the next tier in percent, rounded to 2 decimals.
    /// Exactly 100.0 at the top tier, however far above the threshold the
    /// total is (the division by zero is avoided by this explicit case).
    pub progress: f64,

    /// Points still needed to reach the next tier, 0 at the top.
    pub points_to_next: i64,
}

impl LevelInfo {
    /// Shorthand for the current tier's discount percent.
    #[inline]
    pub fn discount_pct(&self) -> u8 {
        self.current.benefits.discount_pct
    }
}

/// Computes the loyalty level for a point total.
///
/// Point totals are non-negative by invariant (reversals floor at zero);
/// a negative input is clamped to zero rather than panicking.
///
/// ## Example
/// ```rust
/// use tribune_core::loyalty::level_for;
///
/// let level = level_for(1500);
/// assert_eq!(level.current.name, "FANA");
/// assert_eq!(level.discount_pct(), 10);
/// ```
pub fn level_for(points: i64) -> LevelInfo {
    let points = points.max(0);

    let mut index = 0;
    for (i, tier) in TIERS.iter().enumerate() {
        if points >= tier.threshold {
            index = i;
        }
    }

    let current = &TIERS[index];
    let next = TIERS.get(index + 1);

    let (progress, points_to_next) = match next {
        Some(next_tier) => {
            let span = (next_tier.threshold - current.threshold) as f64;
            let raw = (points - current.threshold) as f64 / span * 100.0;
            (round2(raw), next_tier.threshold - points)
        }
        None => (100.0, 0),
    };

    LevelInfo {
        current,
        next,
        progress,
        points_to_next,
    }
}

/// Rounds to 2 decimal places, matching client display expectations.
#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_points_is_gbao() {
        let level = level_for(0);
        assert_eq!(level.current.name, "GBAO");
        assert_eq!(level.discount_pct(), 0);
        assert_eq!(level.progress, 0.0);
        assert_eq!(level.points_to_next, 500);
        assert_eq!(level.next.unwrap().name, "Supporteur");
    }

    #[test]
    fn test_1500_points_is_fana() {
        let level = level_for(1500);
        assert_eq!(level.current.name, "FANA");
        assert_eq!(level.discount_pct(), 10);
        assert_eq!(level.progress, 0.0);
        assert_eq!(level.points_to_next, 1500);
    }

    #[test]
    fn test_threshold_tie_takes_higher_tier() {
        // Exactly at a threshold belongs to the tier it unlocks
        assert_eq!(level_for(500).current.name, "Supporteur");
        assert_eq!(level_for(3000).current.name, "VRAI FANA");
        assert_eq!(level_for(15000).current.name, "GOAT");
    }

    #[test]
    fn test_selection_is_maximal() {
        // For any total, the chosen tier qualifies and no higher tier does
        for p in [0, 1, 499, 500, 1499, 2999, 6999, 7000, 14999, 15000, 1_000_000] {
            let level = level_for(p);
            assert!(level.current.threshold <= p);
            if let Some(next) = level.next {
                assert!(next.threshold > p);
            }
        }
    }

    #[test]
    fn test_progress_midway() {
        // 250 points: halfway between GBAO (0) and Supporteur (500)
        let level = level_for(250);
        assert_eq!(level.progress, 50.0);
        assert_eq!(level.points_to_next, 250);
    }

    #[test]
    fn test_progress_rounds_to_two_decimals() {
        // 1000/(3000-1500)*100 between FANA and VRAI FANA at 2500 points
        let level = level_for(2500);
        assert_eq!(level.current.name, "FANA");
        assert_eq!(level.progress, 66.67);
    }

    #[test]
    fn test_top_tier_progress_is_always_100() {
        for p in [15000, 15001, 20000, 9_999_999] {
            let level = level_for(p);
            assert_eq!(level.current.name, "GOAT");
            assert!(level.next.is_none());
            assert_eq!(level.progress, 100.0);
            assert_eq!(level.points_to_next, 0);
        }
    }

    #[test]
    fn test_negative_points_clamp_to_zero() {
        let level = level_for(-42);
        assert_eq!(level.current.name, "GBAO");
        assert_eq!(level.progress, 0.0);
    }

    #[test]
    fn test_table_is_strictly_ascending() {
        for pair in TIERS.windows(2) {
            assert!(pair[0].threshold < pair[1].threshold);
            assert!(pair[0].benefits.discount_pct < pair[1].benefits.discount_pct);
        }
    }
}
