//! End-to-end checkout flows over an in-memory database.
//!
//! The rate provider is unreachable throughout, so these flows double as
//! the proof that conversion fallback never blocks a purchase.

mod common;

use common::*;

use store_api::error::ErrorKind;
use store_api::services::cart::{self, AddToCartRequest};
use store_api::services::checkout::{self, AddressInput, CheckoutRequest};
use store_api::services::orders;
use store_api::auth::CartActor;
use tribune_core::{JerseySize, OrderStatus, Role};

fn delivery_address() -> AddressInput {
    AddressInput {
        street: "12 Rue des Stades".to_string(),
        city: "Dakar".to_string(),
        postal_code: "10200".to_string(),
        country: "SN".to_string(),
    }
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        delivery_address: delivery_address(),
        expected_delivery: None,
    }
}

async fn fill_cart(
    state: &store_api::AppState,
    actor: &CartActor,
    product_id: &str,
    size: JerseySize,
    quantity: i64,
) {
    cart::add_item(
        state,
        actor,
        AddToCartRequest {
            product_id: product_id.to_string(),
            size: size.label().to_string(),
            quantity,
        },
    )
    .await
    .expect("add to cart");
}

#[tokio::test]
async fn checkout_stores_pre_discount_total_and_captured_percent() {
    let state = test_state().await;

    // 1500 points puts the user on FANA (10% discount)
    let user = seed_user(&state, "Awa", 1500, Role::Customer).await;
    let product = seed_product(&state, "Maillot Domicile", 1_000, 0, &[(JerseySize::M, 5)]).await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    fill_cart(&state, &actor, &product.id, JerseySize::M, 1).await;

    let order = checkout::checkout(&state, &principal, checkout_request())
        .await
        .expect("checkout");

    // The stored total excludes the tier discount; display re-derives it.
    assert_eq!(order.original_total, 1_000);
    assert_eq!(order.discount_pct, 10);
    assert_eq!(order.total.xof, 900.0);
    // Provider down: converted figures fall back to the XOF amount
    assert_eq!(order.total.eur, 900.0);
    assert_eq!(order.status, OrderStatus::Pending);

    // Stock was decremented inside the checkout transaction
    assert_eq!(stock_of(&state, &product.id, JerseySize::M).await, 4);

    // The cart is destroyed, not emptied in place
    let err = cart::view(&state, &actor).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn checkout_with_insufficient_stock_leaves_everything_intact() {
    let state = test_state().await;
    let user = seed_user(&state, "Moussa", 0, Role::Customer).await;
    let product = seed_product(&state, "Maillot Extérieur", 15_000, 0, &[(JerseySize::L, 2)]).await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    fill_cart(&state, &actor, &product.id, JerseySize::L, 2).await;

    // Stock shrinks after the items were added
    state
        .db
        .products()
        .set_stock(&product.id, JerseySize::L, 1)
        .await
        .expect("set stock");

    let err = checkout::checkout(&state, &principal, checkout_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // No order was created, the cart survived, stock is untouched
    let orders = orders::list(&state, &principal).await.expect("list orders");
    assert!(orders.is_empty());
    let view = cart::view(&state, &actor).await.expect("cart still there");
    assert_eq!(view.items.len(), 1);
    assert_eq!(stock_of(&state, &product.id, JerseySize::L).await, 1);
}

#[tokio::test]
async fn empty_cart_checkout_is_an_idempotent_error() {
    let state = test_state().await;
    let user = seed_user(&state, "Fatou", 0, Role::Customer).await;
    let principal = principal_for(&user);

    for _ in 0..3 {
        let err = checkout::checkout(&state, &principal, checkout_request())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("empty"));
    }

    let orders = orders::list(&state, &principal).await.expect("list orders");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn incomplete_address_is_rejected_before_any_write() {
    let state = test_state().await;
    let user = seed_user(&state, "Ibrahima", 0, Role::Customer).await;
    let product = seed_product(&state, "Maillot Third", 8_000, 0, &[(JerseySize::S, 3)]).await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    fill_cart(&state, &actor, &product.id, JerseySize::S, 1).await;

    let mut request = checkout_request();
    request.delivery_address.postal_code = String::new();

    let err = checkout::checkout(&state, &principal, request)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Cart untouched
    let view = cart::view(&state, &actor).await.expect("cart");
    assert_eq!(view.items.len(), 1);
}

#[tokio::test]
async fn past_delivery_date_is_rejected() {
    let state = test_state().await;
    let user = seed_user(&state, "Cheikh", 0, Role::Customer).await;
    let product = seed_product(&state, "Maillot Gardien", 9_000, 0, &[(JerseySize::M, 3)]).await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    fill_cart(&state, &actor, &product.id, JerseySize::M, 1).await;

    let mut request = checkout_request();
    request.expected_delivery = Some("2020-01-01T00:00:00Z".to_string());

    let err = checkout::checkout(&state, &principal, request)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let mut request = checkout_request();
    request.expected_delivery = Some("not-a-date".to_string());
    let err = checkout::checkout(&state, &principal, request)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn product_promo_applies_before_tier_discount() {
    let state = test_state().await;

    // 7000 points puts the user on CR7 VS MESSI (20%)
    let user = seed_user(&state, "Omar", 7_000, Role::Customer).await;
    // 20% product promo on a 10 000 F jersey: unit = 8 000
    let product = seed_product(&state, "Maillot Promo", 10_000, 20, &[(JerseySize::Xl, 4)]).await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    fill_cart(&state, &actor, &product.id, JerseySize::Xl, 2).await;

    let order = checkout::checkout(&state, &principal, checkout_request())
        .await
        .expect("checkout");

    // Stored total: 2 × 8 000 (promo only, tier excluded)
    assert_eq!(order.original_total, 16_000);
    assert_eq!(order.discount_pct, 20);
    // Display: 16 000 × 0.8
    assert_eq!(order.total.xof, 12_800.0);

    let line = &order.items[0];
    assert_eq!(line.unit_price.xof, 6_400.0); // 10 000 × 0.8 × 0.8
    assert_eq!(line.line_total.xof, 12_800.0);
}

#[tokio::test]
async fn cancelling_a_pending_order_restocks_its_lines() {
    let state = test_state().await;
    let user = seed_user(&state, "Aminata", 0, Role::Customer).await;
    let product = seed_product(&state, "Maillot Rétro", 20_000, 0, &[(JerseySize::M, 5)]).await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    fill_cart(&state, &actor, &product.id, JerseySize::M, 3).await;

    let order = checkout::checkout(&state, &principal, checkout_request())
        .await
        .expect("checkout");
    assert_eq!(stock_of(&state, &product.id, JerseySize::M).await, 2);

    let cancelled = orders::cancel(&state, &principal, &order.id)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, &product.id, JerseySize::M).await, 5);

    // A second cancellation is a state error
    let err = orders::cancel(&state, &principal, &order.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::State);
}

#[tokio::test]
async fn inactive_account_cannot_checkout() {
    let state = test_state().await;
    let user = seed_inactive_user(&state, "Blocked").await;
    let principal = principal_for(&user);

    let err = checkout::checkout(&state, &principal, checkout_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}
