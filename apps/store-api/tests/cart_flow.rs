//! Cart ownership, quantity merging, stock guards and the login-time
//! session merge.

mod common;

use common::*;

use store_api::auth::CartActor;
use store_api::error::ErrorKind;
use store_api::services::cart::{self, AddToCartRequest, UpdateCartItemRequest};
use tribune_core::{JerseySize, Role};

fn add_request(product_id: &str, size: &str, quantity: i64) -> AddToCartRequest {
    AddToCartRequest {
        product_id: product_id.to_string(),
        size: size.to_string(),
        quantity,
    }
}

#[tokio::test]
async fn duplicate_product_size_pairs_merge_quantities() {
    let state = test_state().await;
    let product = seed_product(&state, "Maillot Col V", 10_000, 0, &[(JerseySize::M, 10)]).await;
    let actor = CartActor::Session("session-1".to_string());

    cart::add_item(&state, &actor, add_request(&product.id, "M", 2))
        .await
        .expect("first add");
    let view = cart::add_item(&state, &actor, add_request(&product.id, "M", 3))
        .await
        .expect("second add");

    // One line, merged quantity; never two rows for the same (product, size)
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 5);
    assert_eq!(view.original_total, 50_000);

    // A size with no variant on this product is treated as out of stock
    let err = cart::add_item(&state, &actor, add_request(&product.id, "L", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn session_cart_prices_without_tier_discount() {
    let state = test_state().await;
    let product = seed_product(&state, "Maillot Basique", 1_000, 0, &[(JerseySize::S, 5)]).await;
    let actor = CartActor::Session("session-2".to_string());

    let view = cart::add_item(&state, &actor, add_request(&product.id, "S", 1))
        .await
        .expect("add");

    assert_eq!(view.discount_pct, 0);
    assert_eq!(view.total.xof, 1_000.0);
}

#[tokio::test]
async fn user_cart_prices_with_tier_discount() {
    let state = test_state().await;
    // GOAT tier: 25%
    let user = seed_user(&state, "Legende", 15_000, Role::Customer).await;
    let product = seed_product(&state, "Maillot Or", 10_000, 0, &[(JerseySize::M, 5)]).await;
    let actor = CartActor::User(principal_for(&user));

    let view = cart::add_item(&state, &actor, add_request(&product.id, "M", 1))
        .await
        .expect("add");

    assert_eq!(view.discount_pct, 25);
    assert_eq!(view.original_total, 10_000);
    assert_eq!(view.total.xof, 7_500.0);
}

#[tokio::test]
async fn update_and_remove_are_stock_checked_and_owned() {
    let state = test_state().await;
    let product = seed_product(&state, "Maillot Rayé", 5_000, 0, &[(JerseySize::M, 3)]).await;
    let actor = CartActor::Session("session-3".to_string());

    let view = cart::add_item(&state, &actor, add_request(&product.id, "M", 1))
        .await
        .expect("add");
    let item_id = view.items[0].id.clone();

    // Raising beyond stock fails
    let err = cart::update_item(
        &state,
        &actor,
        &item_id,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Within stock succeeds
    let view = cart::update_item(
        &state,
        &actor,
        &item_id,
        UpdateCartItemRequest { quantity: 3 },
    )
    .await
    .expect("update");
    assert_eq!(view.items[0].quantity, 3);

    // Another session cannot touch this line
    let stranger = CartActor::Session("session-4".to_string());
    let err = cart::remove_item(&state, &stranger, &item_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let view = cart::remove_item(&state, &actor, &item_id)
        .await
        .expect("remove");
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn login_merge_hands_over_the_session_cart_when_user_has_none() {
    let state = test_state().await;
    let user = seed_user(&state, "Nouveau", 0, Role::Customer).await;
    let product = seed_product(&state, "Maillot Away", 8_000, 0, &[(JerseySize::L, 5)]).await;

    let session = CartActor::Session("login-session-1".to_string());
    cart::add_item(&state, &session, add_request(&product.id, "L", 2))
        .await
        .expect("session add");

    let merged = cart::merge_on_login(&state, &user.id, "login-session-1")
        .await
        .expect("merge");
    assert_eq!(merged.items.len(), 1);
    assert_eq!(merged.items[0].quantity, 2);

    // The session cart is gone
    let err = cart::view(&state, &session).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The user now owns it
    let user_view = cart::view(&state, &CartActor::User(principal_for(&user)))
        .await
        .expect("user cart");
    assert_eq!(user_view.items.len(), 1);
}

#[tokio::test]
async fn login_merge_combines_lines_and_skips_unsatisfiable_ones() {
    let state = test_state().await;
    let user = seed_user(&state, "Habitue", 0, Role::Customer).await;
    let kept = seed_product(&state, "Maillot Kept", 6_000, 0, &[(JerseySize::M, 10)]).await;
    let dropped = seed_product(&state, "Maillot Dropped", 7_000, 0, &[(JerseySize::S, 1)]).await;

    // User already has 1×M of `kept`
    let user_actor = CartActor::User(principal_for(&user));
    cart::add_item(&state, &user_actor, add_request(&kept.id, "M", 1))
        .await
        .expect("user add");

    // Session holds 2×M of `kept` and 1×S of `dropped`
    let session = CartActor::Session("login-session-2".to_string());
    cart::add_item(&state, &session, add_request(&kept.id, "M", 2))
        .await
        .expect("session add kept");
    cart::add_item(&state, &session, add_request(&dropped.id, "S", 1))
        .await
        .expect("session add dropped");

    // `dropped` sells out before login
    state
        .db
        .products()
        .set_stock(&dropped.id, JerseySize::S, 0)
        .await
        .expect("set stock");

    let merged = cart::merge_on_login(&state, &user.id, "login-session-2")
        .await
        .expect("merge");

    // Quantities merged for the shared line, the unsatisfiable line dropped
    assert_eq!(merged.items.len(), 1);
    assert_eq!(merged.items[0].product_id, kept.id);
    assert_eq!(merged.items[0].quantity, 3);
}
