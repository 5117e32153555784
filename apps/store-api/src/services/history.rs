//! # Payment History Service
//!
//! The append-only ledger mirroring payment events.
//!
//! Mirroring a payment NEVER accrues points: accrual fires exactly once,
//! inside payment creation. Deleting a `paid` entry (administrators only)
//! applies the compensating reversal, recomputed with the same accrual
//! band function and floored at zero, in the same transaction as the
//! delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tribune_core::validation::validate_entity_id;
use tribune_core::{
    points, CoreError, Currency, PaymentHistoryEntry, PaymentMethod, PaymentStatus,
};

use crate::auth::Principal;
use crate::currency::PriceSet;
use crate::error::ApiError;
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordHistoryRequest {
    pub payment_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: PriceSet,
    pub currency: Currency,
    pub transaction_id: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHistoryResponse {
    pub deleted_id: String,

    /// Points subtracted from the user's balance (0 unless the mirrored
    /// payment was `paid`).
    pub points_reversed: i64,
}

// =============================================================================
// Operations
// =============================================================================

/// Mirrors an existing payment into the ledger.
pub async fn record(
    state: &AppState,
    principal: &Principal,
    request: RecordHistoryRequest,
) -> Result<HistoryEntryView, ApiError> {
    debug!(user_id = %principal.id, payment_id = %request.payment_id, "record history requested");

    let user = require_active_user(&state.db, &principal.id).await?;
    validate_entity_id(&request.payment_id).map_err(CoreError::from)?;

    let payment = state
        .db
        .payments()
        .get_by_id(&request.payment_id)
        .await?
        .filter(|p| user.role.is_admin() || p.user_id == user.id)
        .ok_or_else(|| CoreError::PaymentNotFound(request.payment_id.clone()))?;

    // The mirrored order must still exist.
    state
        .db
        .orders()
        .get_by_id(&payment.order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(payment.order_id.clone()))?;

    let entry = PaymentHistoryEntry {
        id: Uuid::new_v4().to_string(),
        order_id: payment.order_id.clone(),
        user_id: payment.user_id.clone(),
        method: payment.method,
        status: payment.status,
        amount: payment.amount,
        currency: payment.currency,
        transaction_id: payment.transaction_id.clone(),
        paid_at: payment.paid_at,
        created_at: Utc::now(),
    };

    state.db.payments().insert_history(&entry).await?;

    info!(entry_id = %entry.id, payment_id = %payment.id, "Payment mirrored into history");

    build_view(state, entry).await
}

/// Lists the caller's history entries; administrators see every entry.
pub async fn list(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<HistoryEntryView>, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;

    let entries = if user.role.is_admin() {
        state.db.payments().list_history_all().await?
    } else {
        state.db.payments().list_history_for_user(&user.id).await?
    };

    let mut views = Vec::with_capacity(entries.len());
    for entry in entries {
        views.push(build_view(state, entry).await?);
    }

    Ok(views)
}

/// Gets one history entry; owners see their own, administrators see any.
pub async fn get(
    state: &AppState,
    principal: &Principal,
    entry_id: &str,
) -> Result<HistoryEntryView, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    validate_entity_id(entry_id).map_err(CoreError::from)?;

    let entry = state
        .db
        .payments()
        .get_history(entry_id)
        .await?
        .filter(|e| user.role.is_admin() || e.user_id == user.id)
        .ok_or_else(|| CoreError::HistoryEntryNotFound(entry_id.to_string()))?;

    build_view(state, entry).await
}

/// Deletes a history entry (administrators only), reversing the point
/// award when the mirrored payment was `paid`.
pub async fn delete(
    state: &AppState,
    principal: &Principal,
    entry_id: &str,
) -> Result<DeleteHistoryResponse, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    if !user.role.is_admin() {
        return Err(CoreError::AdminOnly.into());
    }

    validate_entity_id(entry_id).map_err(CoreError::from)?;

    let entry = state
        .db
        .payments()
        .get_history(entry_id)
        .await?
        .ok_or_else(|| CoreError::HistoryEntryNotFound(entry_id.to_string()))?;

    // Recompute the same band function the accrual used; the balance
    // floors at zero inside the transaction.
    let points_reversed = if entry.status == PaymentStatus::Paid {
        points::points_for_amount(entry.amount).map_err(ApiError::from)?
    } else {
        0
    };

    state
        .db
        .payments()
        .delete_history_with_reversal(entry_id, &entry.user_id, points_reversed)
        .await?;

    info!(entry_id = %entry_id, points_reversed, "History entry deleted");

    Ok(DeleteHistoryResponse {
        deleted_id: entry_id.to_string(),
        points_reversed,
    })
}

// =============================================================================
// Helpers
// =============================================================================

async fn build_view(
    state: &AppState,
    entry: PaymentHistoryEntry,
) -> Result<HistoryEntryView, ApiError> {
    let amount = state.converter.price_set(entry.amount).await;

    Ok(HistoryEntryView {
        id: entry.id,
        order_id: entry.order_id,
        user_id: entry.user_id,
        method: entry.method,
        status: entry.status,
        amount,
        currency: entry.currency,
        transaction_id: entry.transaction_id,
        paid_at: entry.paid_at,
        created_at: entry.created_at,
    })
}
