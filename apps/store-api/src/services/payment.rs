//! # Payment Service
//!
//! Records a payment against a pending order and credits loyalty points.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_payment(user, order)                        │
//! │                                                                         │
//! │  1. GUARDS                                                             │
//! │     ├── account active                                                 │
//! │     ├── order exists and belongs to the caller                         │
//! │     ├── order status is Pending                                        │
//! │     └── no payment exists yet for the order                            │
//! │                                                                         │
//! │  2. CHARGE                                                             │
//! │     ├── amount = order.total × (1 - order.discount_pct/100)            │
//! │     │   (the discount CAPTURED at checkout; the live point balance     │
//! │     │    plays no part here)                                           │
//! │     └── simulated gateway: always succeeds, status = Paid,             │
//! │         transaction id TXN-<millis>-<6 alnum>                          │
//! │                                                                         │
//! │  3. COMMIT (one transaction, in tribune-db)                            │
//! │     ├── insert payment (UNIQUE order_id catches duplicate races)       │
//! │     └── credit accrued points to the user                              │
//! │                                                                         │
//! │  Points accrue exactly once, HERE. The history ledger mirrors the      │
//! │  payment without accruing again.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tribune_core::validation::validate_entity_id;
use tribune_core::{
    points, CoreError, Currency, Money, Payment, PaymentMethod, PaymentStatus,
};
use tribune_db::DbError;

use crate::auth::Principal;
use crate::currency::{CurrencyConverter, PriceSet};
use crate::error::ApiError;
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: String,

    /// `card`, `paypal` or `stripe`.
    pub method: String,

    /// Free-form gateway details, stored verbatim.
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,

    /// Charged amount in all three display currencies (XOF authoritative).
    pub amount: PriceSet,
    pub currency: Currency,
    pub transaction_id: Option<String>,
    pub paid_at: DateTime<Utc>,

    /// Loyalty points credited by this payment (0 on read paths).
    pub points_added: i64,
}

// =============================================================================
// Operations
// =============================================================================

/// Records a payment for a pending order.
pub async fn create(
    state: &AppState,
    principal: &Principal,
    request: CreatePaymentRequest,
) -> Result<PaymentView, ApiError> {
    debug!(user_id = %principal.id, order_id = %request.order_id, "create payment requested");

    let user = require_active_user(&state.db, &principal.id).await?;

    validate_entity_id(&request.order_id).map_err(CoreError::from)?;
    let method: PaymentMethod = request.method.parse().map_err(CoreError::from)?;

    let order = state
        .db
        .orders()
        .get_by_id(&request.order_id)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(|| CoreError::OrderNotFound(request.order_id.clone()))?;

    if !order.status.is_pending() {
        return Err(CoreError::OrderNotPending {
            order_id: order.id,
            status: order.status.label().to_string(),
        }
        .into());
    }

    let payments = state.db.payments();
    if payments.get_by_order(&order.id).await?.is_some() {
        return Err(CoreError::DuplicatePayment(order.id).into());
    }

    // Charge the discount captured on the order at checkout.
    let amount = order.display_total();
    let points = accrual_points(&state.converter, amount.as_f64(), Currency::Xof).await?;

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        user_id: user.id.clone(),
        method,
        // The simulated gateway always succeeds.
        status: PaymentStatus::Paid,
        amount,
        currency: Currency::Xof,
        transaction_id: Some(generate_transaction_id(now)),
        details: request.details.map(|d| d.to_string()),
        paid_at: now,
    };

    match payments.create_with_accrual(&payment, points).await {
        Ok(()) => {}
        // Two concurrent payment calls: the UNIQUE(order_id) loser lands here
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::DuplicatePayment(order.id).into());
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        payment_id = %payment.id,
        order_id = %order.id,
        amount = %payment.amount,
        points,
        "Payment recorded"
    );

    build_view(state, payment, points).await
}

/// Lists the caller's payments; administrators see every payment.
pub async fn list(state: &AppState, principal: &Principal) -> Result<Vec<PaymentView>, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;

    let payments = if user.role.is_admin() {
        state.db.payments().list_all().await?
    } else {
        state.db.payments().list_for_user(&user.id).await?
    };

    let mut views = Vec::with_capacity(payments.len());
    for payment in payments {
        views.push(build_view(state, payment, 0).await?);
    }

    Ok(views)
}

/// Gets one payment; owners see their own, administrators see any.
pub async fn get(
    state: &AppState,
    principal: &Principal,
    payment_id: &str,
) -> Result<PaymentView, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    validate_entity_id(payment_id).map_err(CoreError::from)?;

    let payment = state
        .db
        .payments()
        .get_by_id(payment_id)
        .await?
        .filter(|p| user.role.is_admin() || p.user_id == user.id)
        .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()))?;

    build_view(state, payment, 0).await
}

// =============================================================================
// Helpers
// =============================================================================

/// Computes the loyalty points for a paid amount in any supported currency.
///
/// Non-XOF amounts convert to the base currency first (best-effort: a
/// provider outage bands the raw figure, matching the converter's
/// availability-over-accuracy contract). Fractional converted amounts
/// round to the nearest franc before banding.
pub async fn accrual_points(
    converter: &CurrencyConverter,
    amount: f64,
    currency: Currency,
) -> Result<i64, ApiError> {
    let francs = converter.convert(amount, currency, Currency::Xof).await;
    points::points_for_amount(Money::from_francs(francs.round() as i64)).map_err(ApiError::from)
}

/// Gateway-style transaction identifier: `TXN-<millis>-<6 alnum>`.
fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("TXN-{}-{}", now.timestamp_millis(), &suffix[..6])
}

async fn build_view(
    state: &AppState,
    payment: Payment,
    points_added: i64,
) -> Result<PaymentView, ApiError> {
    let amount = state.converter.price_set(payment.amount).await;

    Ok(PaymentView {
        id: payment.id,
        order_id: payment.order_id,
        user_id: payment.user_id,
        method: payment.method,
        status: payment.status,
        amount,
        currency: payment.currency,
        transaction_id: payment.transaction_id,
        paid_at: payment.paid_at,
        points_added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::ErrorKind;

    #[test]
    fn test_transaction_id_format() {
        let id = generate_transaction_id(Utc::now());
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts[0], "TXN");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
    }

    fn unreachable_converter() -> CurrencyConverter {
        let config = StoreConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            jwt_secret: "test".to_string(),
            exchange_api_url: "http://127.0.0.1:9".to_string(),
            exchange_api_key: "test-key".to_string(),
            exchange_timeout_secs: 1,
            rate_cache_ttl_secs: 60,
        };
        CurrencyConverter::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_accrual_bands_on_base_currency() {
        let converter = unreachable_converter();

        let points = accrual_points(&converter, 14_999.0, Currency::Xof)
            .await
            .unwrap();
        assert_eq!(points, 20);

        let points = accrual_points(&converter, 15_000.0, Currency::Xof)
            .await
            .unwrap();
        assert_eq!(points, 50);
    }

    #[tokio::test]
    async fn test_accrual_rejects_negative_amounts() {
        let converter = unreachable_converter();

        let err = accrual_points(&converter, -1.0, Currency::Xof)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_accrual_converts_foreign_amounts_best_effort() {
        let converter = unreachable_converter();

        // Provider down: the EUR figure bands unconverted (fallback)
        let points = accrual_points(&converter, 20_000.0, Currency::Eur)
            .await
            .unwrap();
        assert_eq!(points, 50);
    }
}
