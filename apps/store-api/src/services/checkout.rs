//! # Checkout Service
//!
//! Converts a mutable cart into an immutable priced order.
//!
//! ## Checkout Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         checkout(user)                                  │
//! │                                                                         │
//! │  1. GUARDS (no writes yet)                                             │
//! │     ├── account active                                                 │
//! │     ├── delivery address complete                                      │
//! │     ├── expected delivery date parseable + strictly future             │
//! │     └── cart exists and is non-empty                                   │
//! │                                                                         │
//! │  2. PRICE (tier discount captured HERE, once)                          │
//! │     ├── per line: product exists, size valid, stock sufficient         │
//! │     ├── unit = list × (1 - product %), then × (1 - tier %)             │
//! │     └── order total = Σ UNDISCOUNTED unit × qty  (audit-safe)          │
//! │                                                                         │
//! │  3. COMMIT (one transaction, in tribune-db)                            │
//! │     ├── insert order + items                                           │
//! │     ├── conditional stock decrement per line                           │
//! │     └── delete the cart                                                │
//! │                                                                         │
//! │  A failed guard or a lost stock race leaves the cart intact and        │
//! │  creates nothing: repeating the call yields the same error.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tribune_core::validation::{validate_address, validate_delivery_date, validate_entity_id};
use tribune_core::{
    loyalty, pricing, Address, CartOwner, CoreError, JerseySize, Money, Order, OrderItem,
    OrderStatus,
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
pub struct CheckoutRequest {
    pub delivery_address: AddressInput,

    /// RFC 3339 timestamp; must be strictly in the future when present.
    pub expected_delivery: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl From<AddressInput> for Address {
    fn from(input: AddressInput) -> Self {
        Address {
            street: input.street,
            city: input.city,
            postal_code: input.postal_code,
            country: input.country,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub product_id: String,
    pub title: String,
    pub size: JerseySize,
    pub quantity: i64,

    /// Tier-discounted unit price, in all three display currencies.
    pub unit_price: PriceSet,

    /// Tier-discounted line total.
    pub line_total: PriceSet,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,

    /// The stored pre-discount XOF total (audit figure).
    pub original_total: i64,

    /// The tier discount percent captured at checkout.
    pub discount_pct: u8,

    /// `original_total × (1 - discount_pct/100)`, converted for display.
    pub total: PriceSet,

    pub delivery_address: Address,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineView>,
}

// =============================================================================
// Operations
// =============================================================================

/// Converts the caller's cart into an order.
pub async fn checkout(
    state: &AppState,
    principal: &Principal,
    request: CheckoutRequest,
) -> Result<OrderView, ApiError> {
    debug!(user_id = %principal.id, "checkout requested");

    let user = require_active_user(&state.db, &principal.id).await?;

    let address: Address = request.delivery_address.into();
    validate_address(&address)?;

    let now = Utc::now();
    let expected_delivery = parse_expected_delivery(request.expected_delivery.as_deref(), now)?;

    let carts = state.db.carts();
    let cart = carts
        .get_by_owner(&CartOwner::User(user.id.clone()))
        .await?
        .ok_or(CoreError::EmptyCart)?;

    let cart_items = carts.get_items(&cart.id).await?;
    if cart_items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    // Tier discount is captured once, here. Payment later charges from the
    // order row and never recomputes against the live balance.
    let level = loyalty::level_for(user.loyalty_points);
    let tier_discount = level.discount_pct();

    let order_id = Uuid::new_v4().to_string();
    let products = state.db.products();

    let mut total = Money::zero();
    let mut order_items = Vec::with_capacity(cart_items.len());

    for item in &cart_items {
        validate_entity_id(&item.product_id)
            .map_err(|_| CoreError::InvalidLineItem(item.product_id.clone()))?;

        let detail = products
            .get_detail(&item.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

        if !detail.can_satisfy(item.size, item.quantity) {
            return Err(CoreError::InsufficientStock {
                product: detail.product.title.clone(),
                size: item.size.label().to_string(),
                available: detail.available(item.size),
                requested: item.quantity,
            }
            .into());
        }

        let line = pricing::price_line(
            detail.product.price,
            detail.product.discount_pct,
            tier_discount,
            item.quantity,
        );
        total += line.undiscounted_line_total;

        order_items.push(OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            product_id: item.product_id.clone(),
            size: item.size,
            quantity: item.quantity,
        });
    }

    let order = Order {
        id: order_id,
        user_id: user.id.clone(),
        total,
        discount_pct: tier_discount,
        delivery_address: address,
        status: OrderStatus::Pending,
        expected_delivery,
        created_at: now,
        updated_at: now,
    };

    // Order insert, per-line stock decrement and cart delete, atomically.
    state
        .db
        .orders()
        .create_checked(&order, &order_items, &cart.id)
        .await?;

    info!(
        order_id = %order.id,
        user_id = %user.id,
        total = %order.total,
        discount_pct = order.discount_pct,
        items = order_items.len(),
        "Order created"
    );

    build_order_view(state, order, order_items).await
}

/// Parses and validates the optional expected delivery date.
fn parse_expected_delivery(
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let date = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| CoreError::InvalidDeliveryDate(e.to_string()))?
        .with_timezone(&Utc);

    validate_delivery_date(date, now)?;
    Ok(Some(date))
}

/// Builds the client view of an order: each line re-priced from the current
/// product and the order's CAPTURED discount, plus converted totals.
///
/// Lines whose product has since been deleted are omitted rather than
/// failing the whole view.
pub(crate) async fn build_order_view(
    state: &AppState,
    order: Order,
    items: Vec<OrderItem>,
) -> Result<OrderView, ApiError> {
    let products = state.db.products();
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let Some(product) = products.get_by_id(&item.product_id).await? else {
            continue;
        };

        let line = pricing::price_line(
            product.price,
            product.discount_pct,
            order.discount_pct,
            item.quantity,
        );

        lines.push(OrderLineView {
            product_id: item.product_id,
            title: product.title,
            size: item.size,
            quantity: item.quantity,
            unit_price: state.converter.price_set(line.discounted_unit_price).await,
            line_total: state.converter.price_set(line.line_total).await,
        });
    }

    let total = state.converter.price_set(order.display_total()).await;

    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        status: order.status,
        original_total: order.total.francs(),
        discount_pct: order.discount_pct,
        total,
        delivery_address: order.delivery_address,
        expected_delivery: order.expected_delivery,
        created_at: order.created_at,
        items: lines,
    })
}
