//! # Rewards Service
//!
//! The read-side of the loyalty program: current points, tier standing,
//! spending totals and the referral block, assembled into one view.

use serde::Serialize;
use tracing::debug;

use tribune_core::loyalty::{self, Tier, TierBenefits, TIERS};
use tribune_core::Money;

use crate::auth::Principal;
use crate::currency::PriceSet;
use crate::error::ApiError;
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierView {
    pub name: &'static str,
    pub threshold: i64,
    pub benefits: TierBenefits,
}

impl From<&'static Tier> for TierView {
    fn from(tier: &'static Tier) -> Self {
        TierView {
            name: tier.name,
            threshold: tier.threshold,
            benefits: tier.benefits,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelView {
    pub current: TierView,
    pub next: Option<TierView>,
    pub progress: f64,
    pub points_to_next: i64,
    pub all_tiers: Vec<TierView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralBlock {
    pub code: String,
    pub referred_users: Vec<String>,
    pub total_earned: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsView {
    pub points: i64,
    pub level: LevelView,
    pub total_orders: i64,

    /// Lifetime pre-discount spend, converted for display.
    pub total_spent: PriceSet,

    pub referrals: ReferralBlock,
}

// =============================================================================
// Operations
// =============================================================================

/// Assembles the caller's rewards overview.
pub async fn rewards(state: &AppState, principal: &Principal) -> Result<RewardsView, ApiError> {
    debug!(user_id = %principal.id, "rewards requested");

    let user = require_active_user(&state.db, &principal.id).await?;

    let level = loyalty::level_for(user.loyalty_points);
    let (total_orders, total_spent_francs) =
        state.db.orders().totals_for_user(&user.id).await?;
    let referred_users = state.db.users().referred_ids(&user.id).await?;

    let total_spent = state
        .converter
        .price_set(Money::from_francs(total_spent_francs))
        .await;

    Ok(RewardsView {
        points: user.loyalty_points,
        level: LevelView {
            current: level.current.into(),
            next: level.next.map(TierView::from),
            progress: level.progress,
            points_to_next: level.points_to_next,
            all_tiers: TIERS.iter().map(TierView::from).collect(),
        },
        total_orders,
        total_spent,
        referrals: ReferralBlock {
            code: user.referral_code,
            referred_users,
            total_earned: user.total_earned,
        },
    })
}
