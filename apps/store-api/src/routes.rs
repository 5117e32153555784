//! # HTTP Routes
//!
//! Thin axum adapters: each handler deserializes the request, resolves the
//! caller, invokes exactly one service function and serializes the result.
//! No business rules live here.
//!
//! ## Surface
//! ```text
//! POST   /referral/redeem       POST   /checkout            GET    /rewards
//! GET    /orders                GET    /orders/{id}         POST   /orders/{id}/cancel
//! PUT    /orders/{id}           POST   /payments            GET    /payments
//! GET    /payments/{id}         POST   /history             GET    /history
//! DELETE /history/{id}          POST   /invoices            GET    /invoices
//! GET    /invoices/{id}         POST   /cart/items          GET    /cart
//! PUT    /cart/items/{id}       DELETE /cart/items/{id}     POST   /cart/merge
//! GET    /health
//! ```

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::auth::{CartActor, Principal, SESSION_HEADER};
use crate::error::ApiError;
use crate::services::{cart, checkout, history, invoice, orders, payment, referral, rewards};
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Referral & rewards
        .route("/referral/redeem", post(redeem_referral))
        .route("/rewards", get(get_rewards))
        // Checkout & orders
        .route("/checkout", post(do_checkout))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order).put(update_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        // Payments & history ledger
        .route("/payments", post(create_payment).get(list_payments))
        .route("/payments/{id}", get(get_payment))
        .route("/history", post(record_history).get(list_history))
        .route("/history/{id}", get(get_history).delete(delete_history))
        // Invoices
        .route("/invoices", post(create_invoice).get(list_invoices))
        .route("/invoices/{id}", get(get_invoice))
        // Cart
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/{id}",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/cart/merge", post(merge_cart))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let db_ok = state.db.health_check().await;
    Ok(Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
    })))
}

// =============================================================================
// Referral & Rewards
// =============================================================================

async fn redeem_referral(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<referral::RedeemRequest>,
) -> Result<Json<referral::RedeemResponse>, ApiError> {
    referral::redeem(&state, &principal, request).await.map(Json)
}

async fn get_rewards(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<rewards::RewardsView>, ApiError> {
    rewards::rewards(&state, &principal).await.map(Json)
}

// =============================================================================
// Checkout & Orders
// =============================================================================

async fn do_checkout(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<checkout::CheckoutRequest>,
) -> Result<(StatusCode, Json<checkout::OrderView>), ApiError> {
    let view = checkout::checkout(&state, &principal, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_orders(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<checkout::OrderView>>, ApiError> {
    orders::list(&state, &principal).await.map(Json)
}

async fn get_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<checkout::OrderView>, ApiError> {
    orders::get(&state, &principal, &id).await.map(Json)
}

async fn update_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<orders::UpdateOrderRequest>,
) -> Result<Json<checkout::OrderView>, ApiError> {
    orders::update(&state, &principal, &id, request).await.map(Json)
}

async fn cancel_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<checkout::OrderView>, ApiError> {
    orders::cancel(&state, &principal, &id).await.map(Json)
}

// =============================================================================
// Payments & History
// =============================================================================

async fn create_payment(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<payment::CreatePaymentRequest>,
) -> Result<(StatusCode, Json<payment::PaymentView>), ApiError> {
    let view = payment::create(&state, &principal, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_payments(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<payment::PaymentView>>, ApiError> {
    payment::list(&state, &principal).await.map(Json)
}

async fn get_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<payment::PaymentView>, ApiError> {
    payment::get(&state, &principal, &id).await.map(Json)
}

async fn record_history(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<history::RecordHistoryRequest>,
) -> Result<(StatusCode, Json<history::HistoryEntryView>), ApiError> {
    let view = history::record(&state, &principal, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_history(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<history::HistoryEntryView>>, ApiError> {
    history::list(&state, &principal).await.map(Json)
}

async fn get_history(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<history::HistoryEntryView>, ApiError> {
    history::get(&state, &principal, &id).await.map(Json)
}

async fn delete_history(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<history::DeleteHistoryResponse>, ApiError> {
    history::delete(&state, &principal, &id).await.map(Json)
}

// =============================================================================
// Invoices
// =============================================================================

async fn create_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<invoice::CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<invoice::InvoiceView>), ApiError> {
    let view = invoice::create(&state, &principal, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_invoices(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<invoice::InvoiceView>>, ApiError> {
    invoice::list(&state, &principal).await.map(Json)
}

async fn get_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<invoice::InvoiceView>, ApiError> {
    invoice::get(&state, &principal, &id).await.map(Json)
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(
    State(state): State<AppState>,
    actor: CartActor,
) -> Result<Json<cart::CartView>, ApiError> {
    cart::view(&state, &actor).await.map(Json)
}

async fn add_cart_item(
    State(state): State<AppState>,
    actor: CartActor,
    Json(request): Json<cart::AddToCartRequest>,
) -> Result<Json<cart::CartView>, ApiError> {
    cart::add_item(&state, &actor, request).await.map(Json)
}

async fn update_cart_item(
    State(state): State<AppState>,
    actor: CartActor,
    Path(id): Path<String>,
    Json(request): Json<cart::UpdateCartItemRequest>,
) -> Result<Json<cart::CartView>, ApiError> {
    cart::update_item(&state, &actor, &id, request).await.map(Json)
}

async fn remove_cart_item(
    State(state): State<AppState>,
    actor: CartActor,
    Path(id): Path<String>,
) -> Result<Json<cart::CartView>, ApiError> {
    cart::remove_item(&state, &actor, &id).await.map(Json)
}

/// Login-time merge: requires BOTH an authenticated principal and the
/// session header naming the anonymous cart to absorb.
async fn merge_cart(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
) -> Result<Json<cart::CartView>, ApiError> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::validation("X-Session-Id header is required to merge a cart"))?;

    cart::merge_on_login(&state, &principal.id, session_id)
        .await
        .map(Json)
}
