//! # Order Queries & Administration
//!
//! Read paths over orders plus the two administered mutations: status
//! updates (validated against the lifecycle) and cancellation with
//! restocking.
//!
//! Order status and payment status are deliberately decoupled: recording a
//! payment never advances the order here, an administrator moves it
//! through `Pending → Paid → Shipped → Delivered` explicitly.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use tribune_core::validation::{validate_delivery_date, validate_entity_id};
use tribune_core::{CoreError, Order, OrderStatus, ValidationError};
use tribune_db::DbError;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::services::checkout::{build_order_view, OrderView};
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    /// New status label (`pending`, `paid`, `shipped`, `delivered`,
    /// `cancelled`).
    pub status: Option<String>,

    /// RFC 3339 timestamp; must be strictly in the future when present.
    pub expected_delivery: Option<String>,
}

// =============================================================================
// Operations
// =============================================================================

/// Lists the caller's orders; administrators see every order.
pub async fn list(state: &AppState, principal: &Principal) -> Result<Vec<OrderView>, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;

    let orders = if user.role.is_admin() {
        state.db.orders().list_all().await?
    } else {
        state.db.orders().list_for_user(&user.id).await?
    };

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let items = state.db.orders().get_items(&order.id).await?;
        views.push(build_order_view(state, order, items).await?);
    }

    Ok(views)
}

/// Gets one order; owners see their own, administrators see any.
pub async fn get(
    state: &AppState,
    principal: &Principal,
    order_id: &str,
) -> Result<OrderView, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    let order = load_visible_order(state, &user.id, user.role.is_admin(), order_id).await?;

    let items = state.db.orders().get_items(&order.id).await?;
    build_order_view(state, order, items).await
}

/// Administrator-only status/delivery-date update, validated against the
/// order lifecycle.
pub async fn update(
    state: &AppState,
    principal: &Principal,
    order_id: &str,
    request: UpdateOrderRequest,
) -> Result<OrderView, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    if !user.role.is_admin() {
        return Err(CoreError::AdminOnly.into());
    }

    validate_entity_id(order_id).map_err(CoreError::from)?;

    let order = state
        .db
        .orders()
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    let now = Utc::now();

    let new_status = match request.status.as_deref() {
        Some(raw) => {
            let status = parse_status(raw)?;
            if !order.status.can_transition_to(status) {
                return Err(CoreError::InvalidStatusTransition {
                    from: order.status.label().to_string(),
                    to: status.label().to_string(),
                }
                .into());
            }
            status
        }
        None => order.status,
    };

    let expected_delivery = match request.expected_delivery.as_deref() {
        Some(raw) => {
            let date = chrono::DateTime::parse_from_rfc3339(raw)
                .map_err(|e| CoreError::InvalidDeliveryDate(e.to_string()))?
                .with_timezone(&Utc);
            validate_delivery_date(date, now)?;
            Some(date)
        }
        None => None,
    };

    state
        .db
        .orders()
        .update_status(order_id, new_status, expected_delivery, now)
        .await?;

    info!(order_id = %order_id, status = %new_status, "Order updated");

    let order = state
        .db
        .orders()
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    let items = state.db.orders().get_items(order_id).await?;
    build_order_view(state, order, items).await
}

/// Cancels a pending order and restocks its line items.
pub async fn cancel(
    state: &AppState,
    principal: &Principal,
    order_id: &str,
) -> Result<OrderView, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    let order = load_visible_order(state, &user.id, user.role.is_admin(), order_id).await?;

    if !order.status.is_pending() {
        return Err(CoreError::OrderNotPending {
            order_id: order.id,
            status: order.status.label().to_string(),
        }
        .into());
    }

    match state.db.orders().cancel_restock(order_id, Utc::now()).await {
        Ok(()) => {}
        // The status flipped between our read and the conditional update
        Err(DbError::PreconditionFailed(_)) => {
            return Err(CoreError::OrderNotPending {
                order_id: order_id.to_string(),
                status: "no longer pending".to_string(),
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    }

    info!(order_id = %order_id, "Order cancelled and restocked");

    let order = state
        .db
        .orders()
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    let items = state.db.orders().get_items(order_id).await?;
    build_order_view(state, order, items).await
}

// =============================================================================
// Helpers
// =============================================================================

/// Loads an order visible to the caller: any order for admins, own orders
/// otherwise. Foreign orders read as absent, not forbidden.
async fn load_visible_order(
    state: &AppState,
    user_id: &str,
    is_admin: bool,
    order_id: &str,
) -> Result<Order, ApiError> {
    validate_entity_id(order_id).map_err(CoreError::from)?;

    debug!(order_id = %order_id, "Loading order");

    let order = state
        .db
        .orders()
        .get_by_id(order_id)
        .await?
        .filter(|o| is_admin || o.user_id == user_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

    Ok(order)
}

/// Parses a status label submitted by an administrator.
fn parse_status(raw: &str) -> Result<OrderStatus, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" => Ok(OrderStatus::Pending),
        "paid" => Ok(OrderStatus::Paid),
        "shipped" => Ok(OrderStatus::Shipped),
        "delivered" => Ok(OrderStatus::Delivered),
        "cancelled" => Ok(OrderStatus::Cancelled),
        _ => Err(CoreError::from(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec![
                "pending".to_string(),
                "paid".to_string(),
                "shipped".to_string(),
                "delivered".to_string(),
                "cancelled".to_string(),
            ],
        })
        .into()),
    }
}
