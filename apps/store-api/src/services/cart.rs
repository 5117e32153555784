//! # Cart Service
//!
//! Cart mutations for both logged-in users and anonymous sessions, priced
//! views, and the login-time merge.
//!
//! ## Ownership
//! A cart belongs to exactly one of {user, session}. The [`CartActor`]
//! extractor resolves which one is driving the request; a user actor also
//! passes the active-account guard and gets the tier discount applied to
//! the priced view (sessions price at 0%).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tribune_core::validation::{validate_entity_id, validate_quantity};
use tribune_core::{
    loyalty, pricing, Cart, CartOwner, CoreError, JerseySize, Money, User, MAX_CART_ITEMS,
};

use crate::auth::CartActor;
use crate::currency::PriceSet;
use crate::error::ApiError;
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub size: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub size: JerseySize,
    pub quantity: i64,

    /// Tier-discounted unit price for the current viewer.
    pub unit_price: PriceSet,

    /// Tier-discounted line total.
    pub line_total: PriceSet,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: String,
    pub items: Vec<CartLineView>,

    /// The viewer's current tier discount (0 for anonymous sessions).
    pub discount_pct: u8,

    /// Pre-discount XOF total.
    pub original_total: i64,

    /// Discounted total, converted for display.
    pub total: PriceSet,
}

// =============================================================================
// Operations
// =============================================================================

/// Adds a line item to the actor's cart, creating the cart on first add.
/// Duplicate (product, size) pairs merge quantities.
pub async fn add_item(
    state: &AppState,
    actor: &CartActor,
    request: AddToCartRequest,
) -> Result<CartView, ApiError> {
    let viewer = resolve_viewer(state, actor).await?;

    validate_entity_id(&request.product_id)
        .map_err(|_| ApiError::from(CoreError::InvalidLineItem(request.product_id.clone())))?;
    validate_quantity(request.quantity).map_err(CoreError::from)?;
    let size: JerseySize = request
        .size
        .parse()
        .map_err(|_| ApiError::from(CoreError::InvalidLineItem(request.size.clone())))?;

    let detail = state
        .db
        .products()
        .get_detail(&request.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

    if !detail.can_satisfy(size, request.quantity) {
        return Err(CoreError::InsufficientStock {
            product: detail.product.title.clone(),
            size: size.label().to_string(),
            available: detail.available(size),
            requested: request.quantity,
        }
        .into());
    }

    let carts = state.db.carts();
    let now = Utc::now();

    let cart = match carts.get_by_owner(&viewer.owner).await? {
        Some(cart) => cart,
        None => {
            let cart = Cart::new(Uuid::new_v4().to_string(), viewer.owner.clone(), now);
            carts.create(&cart).await?;
            cart
        }
    };

    let existing = carts.get_items(&cart.id).await?;
    let already_present = existing
        .iter()
        .any(|i| i.product_id == request.product_id && i.size == size);
    if !already_present && existing.len() >= MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        }
        .into());
    }

    carts
        .upsert_item(&cart.id, &request.product_id, size, request.quantity, now)
        .await?;

    debug!(cart_id = %cart.id, product_id = %request.product_id, "Cart item added");

    build_cart_view(state, &viewer, &cart).await
}

/// Returns the actor's priced cart.
pub async fn view(state: &AppState, actor: &CartActor) -> Result<CartView, ApiError> {
    let viewer = resolve_viewer(state, actor).await?;

    let cart = state
        .db
        .carts()
        .get_by_owner(&viewer.owner)
        .await?
        .ok_or(CoreError::CartNotFound)?;

    build_cart_view(state, &viewer, &cart).await
}

/// Replaces a line item's quantity (stock-checked).
pub async fn update_item(
    state: &AppState,
    actor: &CartActor,
    item_id: &str,
    request: UpdateCartItemRequest,
) -> Result<CartView, ApiError> {
    let viewer = resolve_viewer(state, actor).await?;
    validate_entity_id(item_id).map_err(CoreError::from)?;
    validate_quantity(request.quantity).map_err(CoreError::from)?;

    let carts = state.db.carts();
    let cart = carts
        .get_by_owner(&viewer.owner)
        .await?
        .ok_or(CoreError::CartNotFound)?;

    let item = carts
        .get_item(item_id)
        .await?
        .filter(|i| i.cart_id == cart.id)
        .ok_or_else(|| CoreError::InvalidLineItem(item_id.to_string()))?;

    let detail = state
        .db
        .products()
        .get_detail(&item.product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

    if !detail.can_satisfy(item.size, request.quantity) {
        return Err(CoreError::InsufficientStock {
            product: detail.product.title.clone(),
            size: item.size.label().to_string(),
            available: detail.available(item.size),
            requested: request.quantity,
        }
        .into());
    }

    carts.set_item_quantity(item_id, request.quantity).await?;

    build_cart_view(state, &viewer, &cart).await
}

/// Removes a line item from the actor's cart.
pub async fn remove_item(
    state: &AppState,
    actor: &CartActor,
    item_id: &str,
) -> Result<CartView, ApiError> {
    let viewer = resolve_viewer(state, actor).await?;
    validate_entity_id(item_id).map_err(CoreError::from)?;

    let carts = state.db.carts();
    let cart = carts
        .get_by_owner(&viewer.owner)
        .await?
        .ok_or(CoreError::CartNotFound)?;

    carts
        .get_item(item_id)
        .await?
        .filter(|i| i.cart_id == cart.id)
        .ok_or_else(|| CoreError::InvalidLineItem(item_id.to_string()))?;

    carts.remove_item(item_id).await?;

    build_cart_view(state, &viewer, &cart).await
}

/// Merges the session cart into the user's cart at login.
///
/// Lines whose product vanished or whose stock can no longer satisfy the
/// session quantity are silently skipped; the session cart is deleted
/// either way.
pub async fn merge_on_login(
    state: &AppState,
    user_id: &str,
    session_id: &str,
) -> Result<CartView, ApiError> {
    let user = require_active_user(&state.db, user_id).await?;
    let viewer = Viewer::for_user(&user);

    let carts = state.db.carts();
    let session_cart = carts
        .get_by_owner(&CartOwner::Session(session_id.to_string()))
        .await?;
    let user_cart = carts.get_by_owner(&viewer.owner).await?;

    let merged = match (session_cart, user_cart) {
        (None, Some(cart)) => cart,
        (None, None) => return Err(CoreError::CartNotFound.into()),

        // Session cart exists, user has none: hand the whole cart over.
        (Some(session_cart), None) => {
            carts.retarget_to_user(&session_cart.id, &user.id).await?;
            info!(cart_id = %session_cart.id, user_id = %user.id, "Session cart handed to user");
            carts
                .get_by_owner(&viewer.owner)
                .await?
                .ok_or(CoreError::CartNotFound)?
        }

        // Both exist: merge satisfiable session lines, drop the rest.
        (Some(session_cart), Some(user_cart)) => {
            let session_items = carts.get_items(&session_cart.id).await?;
            let mut lines = Vec::with_capacity(session_items.len());

            for item in session_items {
                let Some(detail) = state.db.products().get_detail(&item.product_id).await? else {
                    continue;
                };
                if !detail.can_satisfy(item.size, item.quantity) {
                    continue;
                }
                lines.push((item.product_id, item.size, item.quantity));
            }

            carts
                .merge_items(&user_cart.id, &session_cart.id, &lines, Utc::now())
                .await?;

            info!(
                user_cart = %user_cart.id,
                merged_lines = lines.len(),
                "Session cart merged into user cart"
            );
            user_cart
        }
    };

    build_cart_view(state, &viewer, &merged).await
}

// =============================================================================
// Helpers
// =============================================================================

/// The resolved identity behind a cart request.
struct Viewer {
    owner: CartOwner,
    /// Tier discount for priced views; anonymous sessions get 0%.
    discount_pct: u8,
}

impl Viewer {
    fn for_user(user: &User) -> Self {
        Viewer {
            owner: CartOwner::User(user.id.clone()),
            discount_pct: loyalty::level_for(user.loyalty_points).discount_pct(),
        }
    }
}

async fn resolve_viewer(state: &AppState, actor: &CartActor) -> Result<Viewer, ApiError> {
    match actor {
        CartActor::User(principal) => {
            let user = require_active_user(&state.db, &principal.id).await?;
            Ok(Viewer::for_user(&user))
        }
        CartActor::Session(session_id) => Ok(Viewer {
            owner: CartOwner::Session(session_id.clone()),
            discount_pct: 0,
        }),
    }
}

/// Builds the priced view of a cart for a viewer.
///
/// Lines whose product has since been deleted are omitted.
async fn build_cart_view(
    state: &AppState,
    viewer: &Viewer,
    cart: &Cart,
) -> Result<CartView, ApiError> {
    let items = state.db.carts().get_items(&cart.id).await?;
    let products = state.db.products();

    let mut original_total = Money::zero();
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let Some(product) = products.get_by_id(&item.product_id).await? else {
            continue;
        };

        let line = pricing::price_line(
            product.price,
            product.discount_pct,
            viewer.discount_pct,
            item.quantity,
        );
        original_total += line.undiscounted_line_total;

        lines.push(CartLineView {
            id: item.id,
            product_id: item.product_id,
            title: product.title,
            size: item.size,
            quantity: item.quantity,
            unit_price: state.converter.price_set(line.discounted_unit_price).await,
            line_total: state.converter.price_set(line.line_total).await,
        });
    }

    let total = state
        .converter
        .price_set(original_total.apply_discount_pct(viewer.discount_pct))
        .await;

    Ok(CartView {
        id: cart.id.clone(),
        items: lines,
        discount_pct: viewer.discount_pct,
        original_total: original_total.francs(),
        total,
    })
}
