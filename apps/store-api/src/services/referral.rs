//! # Referral Service
//!
//! One-time referral-code redemption between two accounts.
//!
//! ## Anti-Abuse Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      redeem(caller, code)                               │
//! │                                                                         │
//! │  code owned by nobody ──────────────► REFERRAL_CODE_NOT_FOUND          │
//! │  code owned by the caller ──────────► SELF_REFERRAL                    │
//! │  caller already redeemed any code ──► ALREADY_REDEEMED                 │
//! │  referrer already recorded caller ──► DUPLICATE_REFERRAL               │
//! │                                                                         │
//! │  Success (ONE transaction in tribune-db):                              │
//! │    referrer: +75 referral pts, +75 loyalty pts, +75 lifetime,          │
//! │              referred set gains the caller                             │
//! │    caller:   +25 loyalty pts, +25 lifetime, code recorded set-once     │
//! │                                                                         │
//! │  The set-once column update and the referred-set primary key replay    │
//! │  these guards inside the transaction, so two racing redemptions        │
//! │  cannot both commit.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tribune_core::loyalty::{REFEREE_BONUS, REFERRER_BONUS};
use tribune_core::validation::validate_referral_code;
use tribune_core::CoreError;
use tribune_db::DbError;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub referral_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    /// Points credited to the code's owner.
    pub referrer_points: i64,

    /// Points credited to the caller.
    pub referee_points: i64,
}

// =============================================================================
// Operations
// =============================================================================

/// Redeems a referral code on behalf of the caller.
pub async fn redeem(
    state: &AppState,
    principal: &Principal,
    request: RedeemRequest,
) -> Result<RedeemResponse, ApiError> {
    debug!(user_id = %principal.id, "referral redemption requested");

    let code = request.referral_code.trim().to_string();
    validate_referral_code(&code).map_err(CoreError::from)?;

    let users = state.db.users();
    let caller = require_active_user(&state.db, &principal.id).await?;

    if caller.referral_code_used.is_some() {
        return Err(CoreError::AlreadyRedeemed.into());
    }

    let referrer = users
        .get_by_referral_code(&code)
        .await?
        .ok_or_else(|| CoreError::ReferralCodeNotFound(code.clone()))?;

    if referrer.id == caller.id {
        return Err(CoreError::SelfReferral.into());
    }

    if users.has_referred(&referrer.id, &caller.id).await? {
        return Err(CoreError::DuplicateReferral.into());
    }

    match users
        .redeem_referral(
            &referrer.id,
            &caller.id,
            &code,
            REFERRER_BONUS,
            REFEREE_BONUS,
            Utc::now(),
        )
        .await
    {
        Ok(()) => {}
        // Racing duplicates surface as constraint hits inside the transaction
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::DuplicateReferral.into());
        }
        Err(DbError::PreconditionFailed(_)) => {
            return Err(CoreError::AlreadyRedeemed.into());
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        referrer_id = %referrer.id,
        referee_id = %caller.id,
        "Referral code redeemed"
    );

    Ok(RedeemResponse {
        referrer_points: REFERRER_BONUS,
        referee_points: REFEREE_BONUS,
    })
}
