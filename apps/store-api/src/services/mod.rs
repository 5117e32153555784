//! # Service Layer
//!
//! One module per operation family. Each service function takes the shared
//! [`AppState`], the authenticated principal (where required) and a typed
//! request, performs every guard BEFORE any write, and delegates the
//! multi-entity mutation to a single transactional repository call.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Module        Operations                                              │
//! │  ──────        ──────────                                              │
//! │  cart          add / view / update / remove / merge-on-login           │
//! │  checkout      cart → immutable priced order                           │
//! │  orders        list / get / admin status update / cancel               │
//! │  payment       create (with single-shot accrual) / list / get          │
//! │  history       mirror / list / get / admin delete (with reversal)      │
//! │  invoice       create / list / get                                     │
//! │  referral      one-time code redemption                                │
//! │  rewards       points, tier, totals, referral block                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod checkout;
pub mod history;
pub mod invoice;
pub mod orders;
pub mod payment;
pub mod referral;
pub mod rewards;

use tribune_core::{CoreError, User};
use tribune_db::Database;

use crate::error::ApiError;

/// Loads a user and rejects missing or deactivated accounts.
///
/// Every authenticated operation funnels through this guard; the token
/// only proves identity, the active flag lives on the account row.
pub(crate) async fn require_active_user(db: &Database, user_id: &str) -> Result<User, ApiError> {
    let user = db
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::UserNotFound(user_id.to_string())))?;

    if !user.active {
        return Err(CoreError::InactiveAccount.into());
    }

    Ok(user)
}
